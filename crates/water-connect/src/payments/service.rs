use std::sync::Arc;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::callback::StkCallbackEnvelope;
use super::domain::{MpesaTransaction, NewTransaction, PaymentPurpose, TransactionStatus};
use super::forms::{DonationForm, PayOrderForm};
use super::gateway::{PaymentGateway, StkPushRequest};
use crate::accounts::{require_account, require_staff, AccountId};
use crate::error::ServiceError;
use crate::marketplace::{OrderId, OrderStatus, VendorId};
use crate::store::PaymentStore;

pub(crate) const DONATION_REFERENCE: &str = "WaterConnect";

/// Pending transaction plus the message shown to the payer.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInitiated {
    pub message: String,
    pub transaction: MpesaTransaction,
}

/// STK push initiation for order payments and donations, and callback reconciliation.
pub struct PaymentService<S> {
    store: Arc<S>,
    gateway: Arc<dyn PaymentGateway>,
}

struct Charge {
    request: StkPushRequest,
    purpose: PaymentPurpose,
    vendor_id: Option<VendorId>,
    order_id: Option<OrderId>,
    initiated_by: AccountId,
}

impl<S> PaymentService<S>
where
    S: PaymentStore + 'static,
{
    pub fn new(store: Arc<S>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    /// Charges the order total, rounded up to whole shillings, to the customer.
    pub async fn pay_for_order(
        &self,
        actor: Option<AccountId>,
        order_id: OrderId,
        form: PayOrderForm,
    ) -> Result<PaymentInitiated, ServiceError> {
        let customer = require_account(self.store.as_ref(), actor)?;
        let order = self
            .store
            .fetch_order(order_id)?
            .ok_or_else(|| ServiceError::not_found("order", order_id.0))?;
        if order.customer != customer.id {
            return Err(ServiceError::PermissionDenied(
                "Only the customer who placed this order can pay for it.",
            ));
        }
        if order.status == OrderStatus::Cancelled {
            return Err(ServiceError::Conflict(format!(
                "Order #{order_id} was cancelled."
            )));
        }
        let already_paid = self
            .store
            .transactions_for_order(order_id)?
            .iter()
            .any(|transaction| transaction.status == TransactionStatus::Completed);
        if already_paid {
            return Err(ServiceError::Conflict(format!(
                "Order #{order_id} has already been paid."
            )));
        }
        let vendor = self
            .store
            .fetch_vendor(order.vendor_id)?
            .ok_or_else(|| ServiceError::not_found("vendor", order.vendor_id.0))?;
        let phone = form.clean(&order.customer_phone)?;

        let amount = order
            .total_cost
            .ceil()
            .to_u64()
            .filter(|amount| *amount > 0)
            .ok_or_else(|| {
                ServiceError::Conflict(format!("Order #{order_id} has nothing to pay."))
            })?;

        self.initiate(Charge {
            request: StkPushRequest {
                phone_number: phone,
                amount,
                account_reference: vendor.business_name,
                description: format!("Water order #{order_id}"),
            },
            purpose: PaymentPurpose::VendorPayment,
            vendor_id: Some(vendor.id),
            order_id: Some(order_id),
            initiated_by: customer.id,
        })
        .await
    }

    pub async fn donate(
        &self,
        actor: Option<AccountId>,
        form: DonationForm,
    ) -> Result<PaymentInitiated, ServiceError> {
        let donor = require_account(self.store.as_ref(), actor)?;
        let input = form.clean()?;
        self.initiate(Charge {
            request: StkPushRequest {
                phone_number: input.phone,
                amount: input.amount,
                account_reference: DONATION_REFERENCE.to_string(),
                description: "Donation".to_string(),
            },
            purpose: PaymentPurpose::Donation,
            vendor_id: None,
            order_id: None,
            initiated_by: donor.id,
        })
        .await
    }

    /// Recorded transactions, newest first.
    pub fn transactions(
        &self,
        actor: Option<AccountId>,
    ) -> Result<Vec<MpesaTransaction>, ServiceError> {
        require_staff(self.store.as_ref(), actor)?;
        let mut transactions = self.store.list_transactions()?;
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(transactions)
    }

    /// Settles a pending transaction from the gateway's callback.
    ///
    /// Unknown references are logged and ignored; settled transactions are left as is.
    pub fn handle_callback(
        &self,
        envelope: StkCallbackEnvelope,
    ) -> Result<Option<MpesaTransaction>, ServiceError> {
        let callback = envelope.body.stk_callback;
        let Some(mut transaction) = self
            .store
            .transaction_by_checkout(&callback.checkout_request_id)?
        else {
            tracing::warn!(
                checkout_request_id = %callback.checkout_request_id,
                "callback for unknown M-Pesa transaction"
            );
            return Ok(None);
        };
        if transaction.status != TransactionStatus::Pending {
            tracing::debug!(
                transaction_id = %transaction.id,
                status = ?transaction.status,
                "ignoring repeated M-Pesa callback"
            );
            return Ok(Some(transaction));
        }

        if callback.succeeded() {
            transaction.status = TransactionStatus::Completed;
            transaction.receipt_number = callback.receipt_number();
        } else {
            transaction.status = TransactionStatus::Failed;
        }
        transaction.result_description = Some(callback.result_desc);
        transaction.updated_at = Utc::now();
        self.store.update_transaction(transaction.clone())?;

        tracing::info!(
            transaction_id = %transaction.id,
            status = ?transaction.status,
            "M-Pesa transaction settled"
        );
        Ok(Some(transaction))
    }

    async fn initiate(&self, charge: Charge) -> Result<PaymentInitiated, ServiceError> {
        let phone = charge.request.phone_number.clone();
        let amount = charge.request.amount;

        let response = match self.gateway.stk_push(charge.request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, phone = %phone, "STK push failed");
                return Err(ServiceError::Gateway(format!("M-Pesa Error: {err}")));
            }
        };
        let Some(reference) = response.accepted_reference() else {
            tracing::warn!(
                code = %response.response_code,
                description = %response.response_description,
                "STK push rejected"
            );
            return Err(ServiceError::Gateway(format!(
                "Failed: {}",
                response.response_description
            )));
        };

        let transaction = self.store.insert_transaction(NewTransaction {
            phone_number: phone.clone(),
            amount,
            purpose: charge.purpose,
            vendor_id: charge.vendor_id,
            order_id: charge.order_id,
            initiated_by: Some(charge.initiated_by),
            checkout_request_id: reference.to_string(),
            created_at: Utc::now(),
        })?;
        tracing::info!(
            transaction_id = %transaction.id,
            amount,
            purpose = ?transaction.purpose,
            "STK push sent"
        );

        Ok(PaymentInitiated {
            message: format!("STK Push sent to {phone}. Check your phone to pay!"),
            transaction,
        })
    }
}
