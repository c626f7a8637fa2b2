use app_grid::catalog::CatalogSnapshot;
use app_grid::config::GridConfig;
use app_grid::events::GridEvent;
use app_grid::grid::AppGridView;
use app_grid::runtime::GridRuntime;
use app_grid::store::JsonLayoutStore;
use app_grid::{GridError, GridView};
use log::warn;
use std::path::PathBuf;

/// Lays out the apps and folders of a catalog snapshot and prints the pages.
///
/// Usage: `app_grid <catalog.json> [--reset]`
fn main() -> Result<(), GridError> {
    let mut args = std::env::args().skip(1);
    let Some(catalog_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: app_grid <catalog.json> [--reset]");
        std::process::exit(2);
    };
    let reset = args.any(|arg| arg == "--reset");

    let config = GridConfig::load();
    let catalog = CatalogSnapshot::load(&catalog_path)?;
    let store = JsonLayoutStore::in_config_dir().unwrap_or_else(|| {
        let fallback = std::env::temp_dir().join("app_grid").join("layout.json");
        warn!("no config dir, keeping layout in {}", fallback.display());
        JsonLayoutStore::new(fallback)
    });

    let mut view = AppGridView::new(config, catalog, store);
    let (tx, mut runtime) = GridRuntime::channel();
    let startup = if reset {
        GridEvent::LayoutReset
    } else {
        GridEvent::AppsChanged
    };
    if tx.send(startup).is_err() {
        warn!("grid runtime went away before startup");
    }
    if tx.send(GridEvent::AreaChanged(view.area())).is_err() {
        warn!("grid runtime went away before startup");
    }
    runtime.run_until_idle(&mut view);

    print_grid(&view);
    Ok(())
}

fn print_grid(view: &AppGridView<CatalogSnapshot, JsonLayoutStore>) {
    for (page, items) in view.state().pages().iter().enumerate() {
        println!("page {page}:");
        for item in items {
            println!("  {:<32} {}", item.display_name, item.id);
        }
    }
    for folder in view.folders() {
        let size = folder
            .layout()
            .map(|layout| {
                format!(
                    "{}x{} ({:.0}x{:.0} px)",
                    layout.columns, layout.rows, layout.pixel_width, layout.pixel_height
                )
            })
            .unwrap_or_else(|| "not laid out".to_string());
        println!("folder {} [{}]: {size}", folder.name(), folder.id());
        for item in folder.state().ordered_items() {
            println!("  {:<32} {}", item.display_name, item.id);
        }
    }
}
