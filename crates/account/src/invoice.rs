use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estate_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Money, PartnerId};
use estate_events::{Command, Event};

estate_core::aggregate_id!(
    /// Customer invoice identifier.
    InvoiceId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Open,
    Void,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub line_no: u32,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl InvoiceLine {
    pub fn amount(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// Aggregate root: Invoice (customer invoice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: InvoiceId,
    partner_id: Option<PartnerId>,
    /// Stream of the record that caused the invoice (the sold property).
    origin: Option<AggregateId>,
    status: InvoiceStatus,
    lines: Vec<InvoiceLine>,
    total: Money,
    version: u64,
    created: bool,
}

impl Invoice {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: InvoiceId) -> Self {
        Self {
            id,
            partner_id: None,
            origin: None,
            status: InvoiceStatus::Open,
            lines: Vec::new(),
            total: Money::ZERO,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn partner_id(&self) -> Option<PartnerId> {
        self.partner_id
    }

    pub fn origin(&self) -> Option<AggregateId> {
        self.origin
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    pub fn total(&self) -> Money {
        self.total
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: IssueInvoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueInvoice {
    pub invoice_id: InvoiceId,
    pub partner_id: PartnerId,
    pub origin: AggregateId,
    pub lines: Vec<InvoiceLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: VoidInvoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidInvoice {
    pub invoice_id: InvoiceId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceCommand {
    IssueInvoice(IssueInvoice),
    VoidInvoice(VoidInvoice),
}

impl Command for InvoiceCommand {
    fn target_aggregate_id(&self) -> AggregateId {
        match self {
            InvoiceCommand::IssueInvoice(c) => c.invoice_id.0,
            InvoiceCommand::VoidInvoice(c) => c.invoice_id.0,
        }
    }
}

/// Event: InvoiceIssued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceIssued {
    pub invoice_id: InvoiceId,
    pub partner_id: PartnerId,
    pub origin: AggregateId,
    pub lines: Vec<InvoiceLine>,
    pub total: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceVoided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceVoided {
    pub invoice_id: InvoiceId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    InvoiceIssued(InvoiceIssued),
    InvoiceVoided(InvoiceVoided),
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceIssued(_) => "account.invoice.issued",
            InvoiceEvent::InvoiceVoided(_) => "account.invoice.voided",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::InvoiceIssued(e) => e.occurred_at,
            InvoiceEvent::InvoiceVoided(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Invoice {
    type Command = InvoiceCommand;
    type Event = InvoiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvoiceEvent::InvoiceIssued(e) => {
                self.id = e.invoice_id;
                self.partner_id = Some(e.partner_id);
                self.origin = Some(e.origin);
                self.lines = e.lines.clone();
                self.total = e.total;
                self.status = InvoiceStatus::Open;
                self.created = true;
            }
            InvoiceEvent::InvoiceVoided(_) => {
                self.status = InvoiceStatus::Void;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvoiceCommand::IssueInvoice(cmd) => self.handle_issue(cmd),
            InvoiceCommand::VoidInvoice(cmd) => self.handle_void(cmd),
        }
    }
}

impl Invoice {
    fn handle_issue(&self, cmd: &IssueInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("invoice already exists"));
        }

        if cmd.lines.is_empty() {
            return Err(DomainError::constraint("cannot issue invoice without lines"));
        }

        let mut total = Money::ZERO;
        for line in &cmd.lines {
            if line.quantity <= 0 {
                return Err(DomainError::constraint(
                    "invoice line quantity must be positive",
                ));
            }
            if !line.unit_price.is_positive() {
                return Err(DomainError::constraint(
                    "invoice line unit price must be positive",
                ));
            }
            let amount = line
                .amount()
                .ok_or_else(|| DomainError::constraint("invoice line amount overflow"))?;
            total = total
                .checked_add(amount)
                .ok_or_else(|| DomainError::constraint("invoice total overflow"))?;
        }

        Ok(vec![InvoiceEvent::InvoiceIssued(InvoiceIssued {
            invoice_id: cmd.invoice_id,
            partner_id: cmd.partner_id,
            origin: cmd.origin,
            lines: cmd.lines.clone(),
            total,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_void(&self, cmd: &VoidInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != cmd.invoice_id {
            return Err(DomainError::invalid_id("invoice_id mismatch"));
        }
        if self.status == InvoiceStatus::Void {
            return Err(DomainError::conflict("invoice is already void"));
        }

        Ok(vec![InvoiceEvent::InvoiceVoided(InvoiceVoided {
            invoice_id: cmd.invoice_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
