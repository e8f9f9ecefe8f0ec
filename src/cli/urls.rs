use crate::error::Result;
use crate::urls::download_urls;

use super::ProjectTarget;

pub fn run(target: &ProjectTarget) -> Result<()> {
    let store = target.open()?;
    let settings = store.load_settings()?;
    let dimensions = store.load_dimensions()?.dimensions;

    let urls = download_urls(&settings, &dimensions)?;
    if urls.is_empty() {
        println!("No dimensions with a sac_name configured.");
        return Ok(());
    }
    for entry in urls {
        println!("{}:\n  {}", entry.name, entry.url);
    }
    println!();
    println!("Save each export into {}", store.downloads_dir().display());
    Ok(())
}
