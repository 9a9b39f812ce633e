pub mod domain;
pub mod notify;
pub mod router;
pub mod service;
pub mod store;
pub mod supabase;

pub use domain::{new_lead_id, Lead, LeadSubmission};
pub use notify::{
    EmailDispatch, EmailGateway, NotificationFanout, NotifyError, ResendGateway,
    SheetsClient, SheetGateway,
};
pub use router::lead_router;
pub use service::{CsvDocument, ExportError, IntakeError, LeadService, SubmitOutcome};
pub use store::{LeadStore, StoreError};
pub use supabase::SupabaseLeadStore;
