//! Accounting extension (event-sourced).
//!
//! Customer invoices and the commission lines billed to a buyer when a
//! property is sold. Pure domain logic: no IO, no storage.

pub mod commission;
pub mod invoice;

pub use commission::{ADMINISTRATIVE_FEE_LABEL, CommissionTerms, sale_invoice_lines};
pub use invoice::{
    Invoice, InvoiceCommand, InvoiceEvent, InvoiceId, InvoiceIssued, InvoiceLine, InvoiceStatus,
    InvoiceVoided, IssueInvoice, VoidInvoice,
};
