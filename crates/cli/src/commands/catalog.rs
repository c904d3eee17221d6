use clap::ValueEnum;
use procura_core::catalog::CatalogEntity;
use procura_core::{Catalog, Catalogs};

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CatalogKind {
    Products,
    Suppliers,
    Companies,
}

/// Summaries of one catalog, optionally filtered by keyword. The keyword is
/// matched against product category, supplier product focus, or company
/// industry focus.
pub fn run(kind: CatalogKind, search: Option<&str>) -> CommandResult {
    let catalogs = Catalogs::seeded();
    let rendered = match kind {
        CatalogKind::Products => summaries(&catalogs.products, search),
        CatalogKind::Suppliers => summaries(&catalogs.suppliers, search),
        CatalogKind::Companies => summaries(&catalogs.companies, search),
    };

    match rendered {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("catalog", "serialization", error.to_string(), 1),
    }
}

fn summaries<T: CatalogEntity>(
    catalog: &Catalog<T>,
    search: Option<&str>,
) -> Result<String, serde_json::Error> {
    let entries = match search {
        Some(keyword) => catalog.search_by_keyword(keyword),
        None => catalog.list_all(),
    };
    serde_json::to_string_pretty(&entries)
}
