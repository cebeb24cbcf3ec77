use crate::catalog::Catalog;
use crate::error::Result;
use crate::settings::{load_settings, settings_file_exists, settings_path};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let catalog_path = settings.catalog_path();

    if settings_file_exists() {
        println!("Settings:   {}", settings_path().display());
    } else {
        println!("Settings:   (defaults, run `diot init` to save)");
    }
    println!("Catalog:    {}", catalog_path.display());
    println!("Exports:    {}", settings.export_dir().display());

    println!();
    if catalog_path.exists() {
        let catalog = Catalog::load(&catalog_path);
        let aliases: usize = catalog.entries().iter().map(|e| e.aliases.len()).sum();
        println!("Vendors:    {}", catalog.len());
        println!("Aliases:    {aliases}");
    } else {
        println!("Catalog not found. Run `diot init` or `diot catalog add` to create it.");
    }
    Ok(())
}
