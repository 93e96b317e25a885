//! Application state and sub-state extractors.
//!
//! AppState is split into domain sub-states so handlers can extract only
//! what they need via Axum's `FromRef`, and to avoid a single god object
//! with duplicate repositories.

use std::sync::Arc;

use kontera_core::Config;
use kontera_db::{DocumentRepository, ExtractionRepository, TenantRepository};
use kontera_ledger::{VoucherConversionService, VoucherService};
use kontera_worker::ExtractionQueue;
use sqlx::PgPool;

use crate::services::reception::ReceptionService;
use crate::task_handlers::ExtractionTaskHandler;

// ----- Sub-state types -----

/// Database pool and entity repositories.
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub tenant_repository: TenantRepository,
    pub document_repository: DocumentRepository,
    pub extraction_repository: ExtractionRepository,
}

/// Ledger collaborators: voucher creation and extraction conversion. The
/// VAT/account repositories live inside the extraction task handler, which
/// snapshots them per job.
#[derive(Clone)]
pub struct LedgerState {
    pub voucher_service: VoucherService,
    pub conversion_service: VoucherConversionService,
}

/// Extraction queue and its job handler.
#[derive(Clone)]
#[allow(dead_code)] // Held for lifetime and shutdown: the queue dispatches through a weak reference to the handler
pub struct TaskState {
    pub extraction_queue: ExtractionQueue,
    pub extraction_handler: Arc<ExtractionTaskHandler>,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub ledger: LedgerState,
    pub tasks: TaskState,
    pub reception: ReceptionService,
    pub config: Config,
    pub is_production: bool,
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for LedgerState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.ledger.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for TaskState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.tasks.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for ReceptionService {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.reception.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
