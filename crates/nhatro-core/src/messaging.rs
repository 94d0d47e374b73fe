//! # Message Payloads
//!
//! Text handed to external collaborators. Delivery lives in nhatro-gateway;
//! this module only renders.
//!
//! ```text
//! Invoice ──► payment_memo()     "INV-2025060001 305"        → bank transfer reference
//!         ──► invoice_message()  "Xin chào ...\n\n..."       → Zalo
//!         ──► share_text()       "Hóa đơn ... - P.305 - ..." → share sheet
//! ```

use crate::invoice::Invoice;

/// Bank-transfer reference: `"<invoiceId> <roomNumber>"`.
pub fn payment_memo(invoice: &Invoice) -> String {
    format!("{} {}", invoice.id, invoice.room_number)
}

/// Zalo invoice notice / reminder.
pub fn invoice_message(invoice: &Invoice) -> String {
    format!(
        "Xin chào {},\n\nHóa đơn tiền phòng tháng {}:\n- Tổng tiền: {}\n- Hạn thanh toán: {}\n\nVui lòng thanh toán đúng hạn. Xin cảm ơn!",
        invoice.tenant_name,
        invoice.month.label(),
        invoice.total_amount,
        invoice.due_date.format("%d/%m/%Y"),
    )
}

/// One-line summary for the share sheet.
pub fn share_text(invoice: &Invoice) -> String {
    format!(
        "Hóa đơn {} - P.{} - {}",
        invoice.id, invoice.room_number, invoice.total_amount
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Dong;
    use chrono::Utc;

    fn invoice() -> Invoice {
        Invoice {
            id: "INV-2025060001".to_string(),
            building_id: "hagl3".to_string(),
            room_id: 7,
            room_number: "305".to_string(),
            tenant_name: "Nguyễn Văn An".to_string(),
            tenant_phone: "0901234567".to_string(),
            month: "2025-05".parse().unwrap(),
            rent_amount: Dong::new(5_000_000),
            electricity_usage: 120,
            electricity_amount: Dong::new(420_000),
            water_usage: 5,
            water_amount: Dong::new(75_000),
            other_fees: Dong::new(130_000),
            total_amount: Dong::new(5_625_000),
            due_date: "2025-06-10".parse().unwrap(),
            paid_date: None,
            created_at: Utc::now(),
            notes: None,
        }
    }

    #[test]
    fn test_payment_memo() {
        assert_eq!(payment_memo(&invoice()), "INV-2025060001 305");
    }

    #[test]
    fn test_invoice_message() {
        assert_eq!(
            invoice_message(&invoice()),
            "Xin chào Nguyễn Văn An,\n\nHóa đơn tiền phòng tháng 05/2025:\n- Tổng tiền: 5.625.000đ\n- Hạn thanh toán: 10/06/2025\n\nVui lòng thanh toán đúng hạn. Xin cảm ơn!"
        );
    }

    #[test]
    fn test_share_text() {
        assert_eq!(
            share_text(&invoice()),
            "Hóa đơn INV-2025060001 - P.305 - 5.625.000đ"
        );
    }
}
