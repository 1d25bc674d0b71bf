use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::ManagedWallet;

/// Pick one enabled wallet on `chain`, uniformly at random.
pub fn select_wallet<'a, R>(
    wallets: &'a [ManagedWallet],
    chain: &str,
    rng: &mut R,
) -> Option<&'a ManagedWallet>
where
    R: Rng + ?Sized,
{
    let eligible: Vec<&ManagedWallet> = wallets
        .iter()
        .filter(|w| w.enabled && w.chain == chain)
        .collect();
    eligible.choose(rng).copied()
}
