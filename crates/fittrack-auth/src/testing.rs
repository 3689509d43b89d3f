//! Helpers for building signed credentials in tests.

use url::form_urlencoded;

use crate::init_data::{self, InitData};

/// Build a URL-encoded `initData` string for `fields`, signed with
/// `bot_token`, with `hash` appended last.
///
/// Fields are encoded in the order given; the signature does not depend on it.
#[allow(clippy::expect_used)]
pub fn sign_init_data(bot_token: &str, fields: &[(&str, &str)]) -> String {
    let data = InitData::from_pairs(fields.iter().copied());
    let secret_key =
        init_data::derive_secret_key(bot_token).expect("HMAC accepts keys of any length");
    let hash = init_data::sign(&secret_key, &data.data_check_string())
        .expect("HMAC accepts keys of any length");

    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in fields {
        query.append_pair(key, value);
    }
    query.append_pair("hash", &hash);
    query.finish()
}
