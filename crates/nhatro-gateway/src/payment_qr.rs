//! # Payment QR
//!
//! VietQR image link for an invoice. The memo is what the tenant types as
//! the transfer reference, so it must stay `"<invoiceId> <roomNumber>"`.
//!
//! ```text
//! https://img.vietqr.io/image/<bank>-<account>-compact2.png
//!     ?amount=<total>&addInfo=<memo>&accountName=<name>
//! ```

use serde::Serialize;

use crate::config::BankAccount;
use nhatro_core::invoice::Invoice;
use nhatro_core::messaging::payment_memo;
use nhatro_core::Dong;

const VIETQR_BASE: &str = "https://img.vietqr.io/image";
const VIETQR_TEMPLATE: &str = "compact2";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQr {
    pub bank: BankAccount,
    pub amount: Dong,
    memo: String,
}

impl PaymentQr {
    pub fn for_invoice(invoice: &Invoice, bank: &BankAccount) -> Self {
        PaymentQr {
            bank: bank.clone(),
            amount: invoice.total_amount,
            memo: payment_memo(invoice),
        }
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn image_url(&self) -> String {
        format!(
            "{}/{}-{}-{}.png?amount={}&addInfo={}&accountName={}",
            VIETQR_BASE,
            urlencoding::encode(&self.bank.bank_id),
            urlencoding::encode(&self.bank.account_number),
            VIETQR_TEMPLATE,
            self.amount.amount(),
            urlencoding::encode(&self.memo),
            urlencoding::encode(&self.bank.account_name),
        )
    }
}
