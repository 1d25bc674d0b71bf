use std::fmt;

use crate::gateway::TransferLeg;

/// Outcome of reading a swap's direction from its transfer legs.
///
/// Only the first leg (what the address spent) and the last leg (what it
/// received) are considered; intermediate multi-hop legs are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapClassification<'a> {
    /// The transaction carried no transfer legs.
    NoLegs,
    /// Both ends carry an NFT identifier.
    Nft,
    /// Neither end is a reference token, so there is no valuation path.
    AltToAlt,
    /// Both ends are reference tokens; no net token exposure.
    BothReference,
    /// A non-reference token was sold for a reference token.
    Sell,
    /// A reference token was spent to acquire `bought`.
    Buy { bought: &'a TransferLeg },
}

impl SwapClassification<'_> {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapClassification::NoLegs => "no_legs",
            SwapClassification::Nft => "nft",
            SwapClassification::AltToAlt => "alt_to_alt",
            SwapClassification::BothReference => "both_reference",
            SwapClassification::Sell => "sell",
            SwapClassification::Buy { .. } => "buy",
        }
    }
}

impl fmt::Display for SwapClassification<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a transaction by its first and last transfer legs.
///
/// Rules, in order:
/// - **Nft**: both ends carry a non-empty token id.
/// - **AltToAlt**: neither end is a reference token.
/// - **BothReference**: both ends are reference tokens.
/// - **Sell**: the received end is a reference token.
/// - **Buy**: everything else (spent a reference token, received an alt).
///
/// A single-leg transaction is its own first and last leg.
pub fn classify_legs<'a, F>(legs: &'a [TransferLeg], is_reference: F) -> SwapClassification<'a>
where
    F: Fn(&str) -> bool,
{
    let (Some(sell_leg), Some(buy_leg)) = (legs.first(), legs.last()) else {
        return SwapClassification::NoLegs;
    };

    if has_token_id(sell_leg) && has_token_id(buy_leg) {
        return SwapClassification::Nft;
    }

    match (is_reference(&sell_leg.symbol), is_reference(&buy_leg.symbol)) {
        (false, false) => SwapClassification::AltToAlt,
        (true, true) => SwapClassification::BothReference,
        (false, true) => SwapClassification::Sell,
        (true, false) => SwapClassification::Buy { bought: buy_leg },
    }
}

fn has_token_id(leg: &TransferLeg) -> bool {
    !leg.token_id.trim().is_empty()
}
