pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod session;
pub mod tracker;

pub use catalog::seed::Catalogs;
pub use catalog::{Catalog, CatalogEntity, EntityKind, IdBinding};
pub use domain::company::{Company, CompanyId, CompanySummary};
pub use domain::conversation::{ConversationRecord, ConversationStatus, RequestContext};
pub use domain::product::{Product, ProductId, ProductSummary};
pub use domain::supplier::{Supplier, SupplierId, SupplierSummary};
pub use errors::{
    ApplicationError, InterfaceError, LookupError, StatusUpdateError,
};
pub use session::{Session, SessionId, SessionRegistry, TranscriptTurn, TurnRole};
pub use tracker::{ConversationStatusTracker, TrackerState};
