#![allow(dead_code)]

use chrono::NaiveDate;

use bizdoc_worker::schema::{
    BankDetails, ClientInfo, DocumentForm, DocumentStatus, DocumentType, LineItem, Sender,
    ServiceDetails, Settings,
};

pub fn date(raw: &str) -> NaiveDate {
    raw.parse().expect("valid date")
}

pub fn sample_sender() -> Sender {
    Sender {
        name: "Northwind Studio".to_string(),
        email: "billing@northwind.dev".to_string(),
        address: "12 Harbour Road\nKochi, Kerala".to_string(),
        phone: "+91 98470 00000".to_string(),
        gst_vat_id: "32ABCDE1234F1Z5".to_string(),
        bank_details: Some(BankDetails {
            account_name: "Northwind Studio LLP".to_string(),
            bank_name: "Federal Bank".to_string(),
            account_number: "10020030040050".to_string(),
            ifsc_code: "FDRL0001000".to_string(),
            ..BankDetails::default()
        }),
        ..Sender::default()
    }
}

pub fn sample_item(price: f64) -> LineItem {
    LineItem {
        service: ServiceDetails::Other,
        description: "Monthly maintenance retainer".to_string(),
        quantity: 1.0,
        currency: "USD".to_string(),
        price,
    }
}

pub fn sample_form(number: &str) -> DocumentForm {
    DocumentForm {
        document_type: DocumentType::Invoice,
        sender: sample_sender(),
        saved_senders: vec![sample_sender()],
        selected_sender: Some(0),
        client: ClientInfo {
            name: "Contoso Retail".to_string(),
            email: "accounts@contoso.example".to_string(),
            address: "1 Market Street".to_string(),
            city: "Bengaluru".to_string(),
            country: "India".to_string(),
            ..ClientInfo::default()
        },
        items: vec![sample_item(1200.0), sample_item(300.0)],
        settings: Settings {
            invoice_number: number.to_string(),
            date: date("2025-06-01"),
            due_date: date("2025-06-15"),
            tax_rate: 18.0,
            discount: 0.0,
            payment_terms: "Net 14".to_string(),
            notes: String::new(),
            status: DocumentStatus::Draft,
            is_paid: false,
        },
    }
}
