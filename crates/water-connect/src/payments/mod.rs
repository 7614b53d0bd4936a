//! M-Pesa STK push payments for vendor orders and donations.

mod callback;
mod daraja;
mod domain;
mod forms;
mod gateway;
mod router;
mod service;

#[cfg(test)]
mod tests;

pub use callback::{CallbackItem, CallbackMetadata, StkCallback, StkCallbackBody, StkCallbackEnvelope};
pub use daraja::DarajaClient;
pub use domain::{
    normalize_phone, InvalidPhoneNumber, MpesaTransaction, NewTransaction, PaymentPurpose,
    TransactionId, TransactionStatus,
};
pub use forms::{DonationForm, DonationInput, PayOrderForm};
pub use gateway::{DisabledGateway, PaymentError, PaymentGateway, StkPushRequest, StkPushResponse};
pub use router::payments_router;
pub use service::{PaymentInitiated, PaymentService};
