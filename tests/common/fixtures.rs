use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use openssl::{
    bn::BigNumContext,
    ec::{EcGroup, EcKey, PointConversionForm},
    nid::Nid,
};
use serde_json::{Value, json};
use time::Date;

pub fn client_body(name: &str, phone: &str) -> Value {
    json!({
        "name": name,
        "phone": phone,
        "email": "cliente@example.com",
        "address": "Av. Samborondon km 2",
    })
}

pub fn contract_body(client_id: i64, monthly_price_cents: i64) -> Value {
    json!({
        "clientId": client_id,
        "kind": "mensual",
        "monthlyPriceCents": monthly_price_cents,
        "startDate": "2024-01-01",
    })
}

/// Browser subscription with a real P-256 key so messages can be encrypted.
pub fn subscription(endpoint: &str) -> Value {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = EcKey::generate(&group).unwrap();
    let mut ctx = BigNumContext::new().unwrap();
    let p256dh = key
        .public_key()
        .to_bytes(&group, PointConversionForm::UNCOMPRESSED, &mut ctx)
        .unwrap();
    let mut auth = [0u8; 16];
    openssl::rand::rand_bytes(&mut auth).unwrap();

    json!({
        "endpoint": endpoint,
        "keys": {
            "p256dh": URL_SAFE_NO_PAD.encode(p256dh),
            "auth": URL_SAFE_NO_PAD.encode(auth),
        }
    })
}

pub fn iso(date: Date) -> String {
    date.to_string()
}
