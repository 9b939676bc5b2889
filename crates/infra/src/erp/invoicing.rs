//! Invoices.

use forgeerp_core::{DomainError, DomainResult};
use forgeerp_invoicing::{Invoice, InvoiceId, InvoiceState};
use forgeerp_revoke::InvoiceService;

use super::{ErpState, InMemoryErp};

impl ErpState {
    /// Store `invoice` under a fresh number if it has none.
    pub(super) fn insert_invoice(&mut self, mut invoice: Invoice) -> InvoiceId {
        if invoice.number.is_none() {
            invoice.number = Some(self.next_number("INV-"));
        }
        let id = invoice.id;
        self.invoices.insert(id, invoice);
        id
    }

    fn advance_invoice(
        &mut self,
        id: InvoiceId,
        from: &[InvoiceState],
        to: InvoiceState,
    ) -> DomainResult<()> {
        let invoice = self.invoice_mut(id)?;
        if !from.contains(&invoice.state) {
            return Err(DomainError::invariant(format!(
                "invoice {id} is {} and cannot become {}",
                invoice.state.as_str(),
                to.as_str()
            )));
        }
        invoice.state = to;
        self.refresh_sales_invoicing(id)
    }
}

impl InvoiceService for InMemoryErp {
    fn invoice(&self, id: InvoiceId) -> DomainResult<Invoice> {
        self.read().invoice(id).cloned()
    }

    fn cancel_invoices(&self, ids: &[InvoiceId]) -> DomainResult<()> {
        let mut state = self.write();
        for id in ids {
            state.invoice_mut(*id)?.cancel()?;
        }
        Ok(())
    }
}

/// Accounting operations on invoices.
impl InMemoryErp {
    pub fn validate_invoice(&self, id: InvoiceId) -> DomainResult<()> {
        self.write()
            .advance_invoice(id, &[InvoiceState::Draft], InvoiceState::Validated)
    }

    pub fn post_invoice(&self, id: InvoiceId) -> DomainResult<()> {
        self.write().advance_invoice(
            id,
            &[InvoiceState::Draft, InvoiceState::Validated],
            InvoiceState::Posted,
        )
    }

    pub fn pay_invoice(&self, id: InvoiceId) -> DomainResult<()> {
        self.write()
            .advance_invoice(id, &[InvoiceState::Posted], InvoiceState::Paid)
    }
}
