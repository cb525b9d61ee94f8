//! Order message sent through WhatsApp.

use crate::domain::aggregates::CartSnapshot;
use crate::domain::value_objects::{OrderRef, Price};

/// Customer block printed under the item list.
#[derive(Clone, Copy, Debug)]
pub struct Recipient<'a> {
    pub name: &'a str,
    pub address: &'a str,
    pub phone: Option<&'a str>,
}

/// Renders the order message. Output depends only on the arguments.
pub fn compose(reference: &OrderRef, snapshot: &CartSnapshot, total: Price, to: Recipient<'_>) -> String {
    let mut message = String::from("Halo, saya ingin memesan:\n\n");
    message.push_str(&format!("📋 *Order ID: {reference}*\n\n"));
    for (index, item) in snapshot.items().iter().enumerate() {
        message.push_str(&format!(
            "{}. {}\n   Jumlah: {}\n   Harga: {}\n   Subtotal: {}\n\n",
            index + 1,
            item.name,
            item.quantity,
            item.price,
            item.line_total()
        ));
    }
    message.push_str(&format!("*Total: {total}*\n\n"));
    message.push_str(&format!("👤 Nama: {}\n", to.name));
    message.push_str(&format!("📍 Alamat: {}", to.address));
    if let Some(phone) = to.phone {
        message.push_str(&format!("\n📱 Telepon: {phone}"));
    }
    message
}
