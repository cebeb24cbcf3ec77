use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path};

pub fn run(catalog: Option<String>, export_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(path) = catalog {
        settings.catalog_path = shellexpand_path(&path);
    }
    if let Some(dir) = export_dir {
        settings.export_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    std::fs::create_dir_all(PathBuf::from(&settings.export_dir))?;
    let catalog_path = settings.catalog_path();
    if !catalog_path.exists() {
        Catalog::new().save(&catalog_path)?;
        println!("Created empty catalog at {}", catalog_path.display());
    }

    println!("Settings saved to {}", settings_path().display());
    Ok(())
}
