//! Essential dignities of a body in a sign.

use super::body::Body;
use super::sign::Sign;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dignity {
    Domicile,
    Exaltation,
    Detriment,
    Fall,
    Peregrine,
}

/// Exaltation sign for the classical planets; falls sit in the opposite sign.
fn exaltation_sign(body: Body) -> Option<Sign> {
    match body {
        Body::Sun => Some(Sign::Aries),
        Body::Moon => Some(Sign::Taurus),
        Body::Mercury => Some(Sign::Virgo),
        Body::Venus => Some(Sign::Pisces),
        Body::Mars => Some(Sign::Capricorn),
        Body::Jupiter => Some(Sign::Cancer),
        Body::Saturn => Some(Sign::Libra),
        _ => None,
    }
}

fn rules(body: Body, sign: Sign) -> bool {
    sign.ruler(false) == body || sign.ruler(true) == body
}

/// Dignity of `body` placed in `sign`.
///
/// Domicile beats exaltation when both apply (Mercury in Virgo). Nodes and Chiron are always
/// peregrine.
pub fn dignity_of(body: Body, sign: Sign) -> Dignity {
    if rules(body, sign) {
        return Dignity::Domicile;
    }
    if exaltation_sign(body) == Some(sign) {
        return Dignity::Exaltation;
    }
    if rules(body, sign.opposite()) {
        return Dignity::Detriment;
    }
    if exaltation_sign(body).map(Sign::opposite) == Some(sign) {
        return Dignity::Fall;
    }
    Dignity::Peregrine
}
