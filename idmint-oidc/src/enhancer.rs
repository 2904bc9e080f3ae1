//! Scope-gated claim population from a user record.
//!
//! Each enhancer takes the claims accumulator by value and hands it back, so
//! the order and effect of every step can be checked on its own.

use std::collections::BTreeSet;

use idmint_core::claims::{epoch_seconds, insert_opt, scopes, ClaimsMap};
use idmint_core::User;
use serde_json::Value;

/// Populates identity-token claims for the OIDC standard scopes.
///
/// `address` and `phone` default to passing the claims through unchanged.
/// Absent user attributes are omitted, never written as null.
pub trait ClaimsEnhancer: Send + Sync {
    /// Claims for the `profile` scope.
    fn add_profile_claims(&self, claims: ClaimsMap, user: &User) -> ClaimsMap;

    /// Claims for the `email` scope.
    fn add_email_claims(&self, claims: ClaimsMap, user: &User) -> ClaimsMap;

    /// Claims for the `address` scope.
    fn add_address_claims(&self, claims: ClaimsMap, _user: &User) -> ClaimsMap {
        claims
    }

    /// Claims for the `phone` scope.
    fn add_phone_claims(&self, claims: ClaimsMap, _user: &User) -> ClaimsMap {
        claims
    }
}

/// Maps [`User`] fields onto the OIDC Core §5.1 standard claims.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardClaimsEnhancer;

impl ClaimsEnhancer for StandardClaimsEnhancer {
    fn add_profile_claims(&self, mut claims: ClaimsMap, user: &User) -> ClaimsMap {
        let name = user.name.clone().or_else(|| full_name(user));
        insert_opt(&mut claims, "name", name);
        insert_opt(&mut claims, "given_name", user.given_name.clone());
        insert_opt(&mut claims, "family_name", user.family_name.clone());
        insert_opt(&mut claims, "middle_name", user.middle_name.clone());
        insert_opt(&mut claims, "nickname", user.nickname.clone());
        if !user.username.is_empty() {
            claims.insert("preferred_username".into(), Value::from(user.username.clone()));
        }
        insert_opt(&mut claims, "gender", user.gender.clone());
        insert_opt(&mut claims, "birthdate", user.birthdate.map(|d| d.to_string()));
        insert_opt(&mut claims, "zoneinfo", user.zoneinfo.clone());
        insert_opt(&mut claims, "locale", user.locale.clone());
        insert_opt(&mut claims, "updated_at", user.updated_at.map(epoch_seconds));
        claims
    }

    fn add_email_claims(&self, mut claims: ClaimsMap, user: &User) -> ClaimsMap {
        if let Some(email) = &user.email {
            claims.insert("email".into(), Value::from(email.clone()));
            claims.insert("email_verified".into(), Value::from(user.email_verified));
        }
        claims
    }

    fn add_address_claims(&self, mut claims: ClaimsMap, user: &User) -> ClaimsMap {
        if let Some(address) = &user.address {
            match serde_json::to_value(address) {
                Ok(Value::Object(fields)) if !fields.is_empty() => {
                    claims.insert("address".into(), Value::Object(fields));
                }
                _ => {}
            }
        }
        claims
    }

    fn add_phone_claims(&self, mut claims: ClaimsMap, user: &User) -> ClaimsMap {
        if let Some(phone) = &user.phone_number {
            claims.insert("phone_number".into(), Value::from(phone.clone()));
            claims.insert(
                "phone_number_verified".into(),
                Value::from(user.phone_number_verified),
            );
        }
        claims
    }
}

fn full_name(user: &User) -> Option<String> {
    match (&user.given_name, &user.family_name) {
        (Some(given), Some(family)) => Some(format!("{given} {family}")),
        (Some(given), None) => Some(given.clone()),
        (None, Some(family)) => Some(family.clone()),
        (None, None) => None,
    }
}

/// Run every enhancer whose scope was granted, in the order
/// profile, email, address, phone.
pub fn apply_scope_enhancers<E: ClaimsEnhancer + ?Sized>(
    enhancer: &E,
    claims: ClaimsMap,
    user: &User,
    granted: &BTreeSet<String>,
) -> ClaimsMap {
    let mut claims = claims;
    if granted.contains(scopes::PROFILE) {
        claims = enhancer.add_profile_claims(claims, user);
    }
    if granted.contains(scopes::EMAIL) {
        claims = enhancer.add_email_claims(claims, user);
    }
    if granted.contains(scopes::ADDRESS) {
        claims = enhancer.add_address_claims(claims, user);
    }
    if granted.contains(scopes::PHONE) {
        claims = enhancer.add_phone_claims(claims, user);
    }
    claims
}
