//! Human-checkable pairing challenge.
//!
//! Both devices receive the same numeric authentication token from the
//! transport. Each side maps it to one symbol of [`PALETTE`] and the user
//! confirms on the host that it matches what the handheld shows. This only
//! deters a man in the middle; it is not a cryptographic check.
//!
//! The mapping must stay bit-for-bit identical on both peers: a rolling
//! `hash * 31 + code_unit` over the token's UTF-16 code units, wrapped to 32
//! bits, then the magnitude modulo the palette size.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const PALETTE: [&str; 10] = [
    "😀", "😎", "🎮", "🌟", "🎵", "🎨", "📱", "💻", "🎯", "🎲",
];

/// Number of symbols offered to the user.
const OPTION_COUNT: usize = 3;

/// Three symbols offered to the user, exactly one of them correct.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingChallenge {
    pub correct_symbol: String,
    pub options: Vec<String>,
}

pub fn token_hash(token: &str) -> i32 {
    token.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_mul(31)
            .wrapping_add(i32::from(unit))
    })
}

/// The symbol both peers derive for `token`.
pub fn correct_symbol(token: &str) -> &'static str {
    let index = token_hash(token).unsigned_abs() as usize % PALETTE.len();
    PALETTE[index]
}

impl PairingChallenge {
    /// Builds the challenge for `token` with two random decoys in random
    /// order.
    pub fn for_token(token: &str) -> Self {
        Self::for_token_with_rng(token, &mut rand::rng())
    }

    pub fn for_token_with_rng<R: Rng + ?Sized>(
        token: &str,
        rng: &mut R,
    ) -> Self {
        let correct = correct_symbol(token);

        let mut decoys: Vec<&str> = PALETTE
            .iter()
            .copied()
            .filter(|symbol| *symbol != correct)
            .collect();
        decoys.shuffle(rng);

        let mut options: Vec<String> = decoys
            .into_iter()
            .take(OPTION_COUNT - 1)
            .chain(std::iter::once(correct))
            .map(str::to_owned)
            .collect();
        options.shuffle(rng);

        Self {
            correct_symbol: correct.to_owned(),
            options,
        }
    }

    pub fn accepts(&self, selected: &str) -> bool {
        selected == self.correct_symbol
    }
}
