mod common;

use alloy::primitives::U256;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use smartmoney::db::DomainStore;
use smartmoney::errors::PipelineError;
use smartmoney::gateway::TxReceipt;
use smartmoney::models::{BuySignal, TradeStatus};

use common::{
    harness, leg, open_trade, ts, units, wallet, ETH_NATIVE, ETH_USDC, PEPE, SHIB, WETH,
};

const WATCHED: &str = "0x00000000000000000000000000000000000000aa";
const OTHER_WATCHED: &str = "0x00000000000000000000000000000000000000bb";
const WALLET: &str = "0x00000000000000000000000000000000000000c1";

/// Watched address bought PEPE with WETH in `tx`; our wallet can buy
/// 123456.789 PEPE for 0.1 ETH.
fn script_pepe_buy(h: &common::Harness, address: &str, tx: &str) {
    h.gateway.set_latest(address, tx, ts(1_700_000_000));
    h.gateway.set_legs(
        tx,
        vec![leg("WETH", WETH, "0.5"), leg("PEPE", PEPE, "4000000")],
    );
    h.gateway.set_quote(
        ETH_NATIVE,
        PEPE,
        U256::from(123_456_789u64) * U256::from(10u64).pow(U256::from(15u64)),
        18,
        180_000,
    );
}

async fn seeded() -> common::Harness {
    let h = harness();
    h.store.add_wallet(wallet("eth", WALLET, dec!(0.1))).await;
    h
}

// ---------------------------------------------------------------------------
// Signal detection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_repeated_pass_without_new_transaction_is_idempotent() {
    let h = seeded().await;
    let address = h.store.add_address("eth", WATCHED).await;
    script_pepe_buy(&h, WATCHED, "0xtx1");

    h.detector.run_pass().await.unwrap();
    let after_first = h.store.address(address.id).await.unwrap();
    assert_eq!(h.store.trades().await.len(), 1);

    let summary = h.detector.run_pass().await.unwrap().unwrap();
    let after_second = h.store.address(address.id).await.unwrap();

    assert_eq!(summary.new_transactions, 0);
    assert_eq!(h.store.trades().await.len(), 1);
    assert_eq!(after_second.last_seen_tx_hash, after_first.last_seen_tx_hash);
    assert_eq!(after_second.last_seen_tx_time, after_first.last_seen_tx_time);
    assert_eq!(h.gateway.legs_calls(), 1, "seen transaction must not be re-fetched");
}

#[tokio::test]
async fn test_alt_to_alt_advances_last_seen_without_trade() {
    let h = seeded().await;
    let address = h.store.add_address("eth", WATCHED).await;
    h.gateway.set_latest(WATCHED, "0xalt", ts(1_700_000_100));
    h.gateway
        .set_legs("0xalt", vec![leg("SHIB", SHIB, "10"), leg("PEPE", PEPE, "20")]);

    h.detector.run_pass().await.unwrap();

    let row = h.store.address(address.id).await.unwrap();
    assert_eq!(row.last_seen_tx_hash.as_deref(), Some("0xalt"));
    assert_eq!(row.last_seen_tx_time, Some(ts(1_700_000_100)));
    assert!(h.store.trades().await.is_empty());
    assert!(h.gateway.submitted().is_empty());
}

#[tokio::test]
async fn test_sell_and_reference_swaps_are_ignored() {
    let h = seeded().await;
    let seller = h.store.add_address("eth", WATCHED).await;
    let hedger = h.store.add_address("eth", OTHER_WATCHED).await;

    h.gateway.set_latest(WATCHED, "0xsell", ts(1_700_000_000));
    h.gateway
        .set_legs("0xsell", vec![leg("PEPE", PEPE, "10"), leg("WETH", WETH, "1")]);
    h.gateway.set_latest(OTHER_WATCHED, "0xhedge", ts(1_700_000_000));
    h.gateway.set_legs(
        "0xhedge",
        vec![leg("USDC", ETH_USDC, "100"), leg("WETH", WETH, "0.05")],
    );

    h.detector.run_pass().await.unwrap();

    assert!(h.store.trades().await.is_empty());
    for id in [seller.id, hedger.id] {
        assert!(h.store.address(id).await.unwrap().last_seen_tx_hash.is_some());
    }
}

#[tokio::test]
async fn test_out_of_order_timestamp_is_still_marked_seen() {
    let h = seeded().await;
    let address = h.store.add_address("eth", WATCHED).await;
    h.store
        .advance_last_seen(address.id, "0xprev", ts(1_700_000_500))
        .await
        .unwrap();
    // Explorer reports the new transaction with an earlier timestamp.
    script_pepe_buy(&h, WATCHED, "0xbuy");

    h.detector.run_pass().await.unwrap();

    let row = h.store.address(address.id).await.unwrap();
    assert_eq!(row.last_seen_tx_hash.as_deref(), Some("0xbuy"));
    let trades = h.store.trades().await;
    assert_eq!(trades.len(), 1);

    // Even with the token freed, the same transaction is not mirrored again.
    h.store.close_trade(trades[0].id).await.unwrap();
    let summary = h.detector.run_pass().await.unwrap().unwrap();

    assert_eq!(summary.new_transactions, 0);
    assert_eq!(h.store.trades().await.len(), 1);
    assert_eq!(h.gateway.legs_calls(), 1);
}

#[tokio::test]
async fn test_empty_legs_advance_last_seen() {
    let h = seeded().await;
    let address = h.store.add_address("eth", WATCHED).await;
    h.gateway.set_latest(WATCHED, "0xempty", ts(1_700_000_000));

    h.detector.run_pass().await.unwrap();

    let row = h.store.address(address.id).await.unwrap();
    assert_eq!(row.last_seen_tx_hash.as_deref(), Some("0xempty"));
    assert!(h.store.trades().await.is_empty());
}

#[tokio::test]
async fn test_buy_signal_opens_one_trade() {
    let h = seeded().await;
    h.store.add_address("eth", WATCHED).await;
    script_pepe_buy(&h, WATCHED, "0xbuy");

    let summary = h.detector.run_pass().await.unwrap().unwrap();
    assert_eq!(summary.signals, 1);
    assert_eq!(summary.trades_opened, 1);

    let trades = h.store.trades().await;
    assert_eq!(trades.len(), 1);
    let trade = &trades[0];
    assert_eq!(trade.status(), TradeStatus::Open);
    assert_eq!(trade.chain, "eth");
    assert_eq!(trade.watched_address, WATCHED);
    assert_eq!(trade.wallet_address, WALLET);
    assert_eq!(trade.follow_buy_tx_hash, "0xbuy");
    assert_eq!(trade.follow_buy_time, ts(1_700_000_000));
    assert_eq!(trade.buy_token_address, PEPE);
    assert_eq!(trade.buy_symbol, "PEPE");
    assert_eq!(trade.follow_buy_amount, dec!(4000000));
    assert_eq!(trade.buy_token_decimals, 18);
    assert_eq!(trade.wallet_buy_amount, dec!(123456.789));
    assert_eq!(trade.wallet_exit_amount, dec!(0.1));
    // 21000 gas at 10 gwei
    assert_eq!(trade.gas_cost, dec!(0.00021));
    assert!(trade.wallet_buy_tx_hash.is_some());
    assert!(trade.wallet_buy_time.is_some());
    assert!(!trade.principal_sold);

    let quotes = h.gateway.quote_calls();
    assert_eq!(
        quotes[0],
        (ETH_NATIVE.to_string(), PEPE.to_string(), units(1, 17))
    );
}

#[tokio::test]
async fn test_first_buy_approves_router_when_allowance_is_zero() {
    let h = seeded().await;
    h.store.add_address("eth", WATCHED).await;
    script_pepe_buy(&h, WATCHED, "0xbuy");

    h.detector.run_pass().await.unwrap();

    assert_eq!(h.gateway.approvals_built(), 1);
    let submitted = h.gateway.submitted();
    assert_eq!(submitted.len(), 2);
    assert!(submitted[0].data.starts_with("approve:"));
    assert!(submitted[1].data.starts_with("swap:"));
}

#[tokio::test]
async fn test_existing_allowance_skips_approval() {
    let h = seeded().await;
    h.store.add_address("eth", WATCHED).await;
    script_pepe_buy(&h, WATCHED, "0xbuy");
    h.gateway.set_allowance(U256::from(1u64));

    h.detector.run_pass().await.unwrap();

    assert_eq!(h.gateway.approvals_built(), 0);
    assert_eq!(h.gateway.submitted().len(), 1);
}

#[tokio::test]
async fn test_unclosed_trade_blocks_second_trade_for_same_token() {
    let h = seeded().await;
    h.store
        .insert_trade(&open_trade(PEPE, "0xsomeoneelse"))
        .await
        .unwrap();
    let address = h.store.add_address("eth", OTHER_WATCHED).await;
    script_pepe_buy(&h, OTHER_WATCHED, "0xlater");

    let summary = h.detector.run_pass().await.unwrap().unwrap();

    assert_eq!(summary.signals, 1);
    assert_eq!(summary.trades_opened, 0);
    assert_eq!(h.store.trades().await.len(), 1);
    assert!(h.gateway.submitted().is_empty());
    let row = h.store.address(address.id).await.unwrap();
    assert_eq!(row.last_seen_tx_hash.as_deref(), Some("0xlater"));
}

#[tokio::test]
async fn test_two_addresses_buying_same_token_in_one_pass() {
    let h = seeded().await;
    h.store.add_address("eth", WATCHED).await;
    h.store.add_address("eth", OTHER_WATCHED).await;
    script_pepe_buy(&h, WATCHED, "0xfirst");
    script_pepe_buy(&h, OTHER_WATCHED, "0xsecond");

    h.detector.run_pass().await.unwrap();

    let trades = h.store.trades().await;
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].watched_address, WATCHED);
}

#[tokio::test]
async fn test_failed_trade_also_blocks_token() {
    let h = seeded().await;
    let mut failed = open_trade(PEPE, WALLET);
    failed.status = TradeStatus::Failed;
    h.store.insert_trade(&failed).await.unwrap();
    h.store.add_address("eth", WATCHED).await;
    script_pepe_buy(&h, WATCHED, "0xretry");

    h.detector.run_pass().await.unwrap();

    assert_eq!(h.store.trades().await.len(), 1);
}

#[tokio::test]
async fn test_store_rejection_after_swap_surfaces_error() {
    let h = seeded().await;
    // A row the detector would normally have caught makes the insert fail.
    h.store
        .insert_trade(&open_trade(PEPE, "0xsomeoneelse"))
        .await
        .unwrap();
    script_pepe_buy(&h, WATCHED, "0xbuy");
    let signal = BuySignal {
        chain: "eth".into(),
        watched_address: WATCHED.into(),
        tx_hash: "0xbuy".into(),
        tx_time: ts(1_700_000_000),
        token_address: PEPE.into(),
        symbol: "PEPE".into(),
        amount: dec!(4000000),
    };
    let wallets = h.store.enabled_wallets().await.unwrap();

    let result = h.executor.execute(&signal, &wallets).await;

    assert!(matches!(result, Err(PipelineError::Store(_))));
    assert!(!h.gateway.submitted().is_empty(), "swap went out before the insert");
    assert_eq!(h.store.trades().await.len(), 1);
}

#[tokio::test]
async fn test_submission_failure_records_failed_trade() {
    let h = seeded().await;
    let address = h.store.add_address("eth", WATCHED).await;
    script_pepe_buy(&h, WATCHED, "0xbuy");
    h.gateway.fail_submit(true);

    let summary = h.detector.run_pass().await.unwrap().unwrap();
    assert_eq!(summary.trades_failed, 1);

    let trades = h.store.trades().await;
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].status(), TradeStatus::Failed);
    let reason = trades[0].failure_reason.as_deref().unwrap();
    assert!(reason.contains("nonce too low"), "reason: {reason}");
    assert!(trades[0].wallet_buy_tx_hash.is_none());

    // Not retried on the next pass.
    h.gateway.fail_submit(false);
    h.detector.run_pass().await.unwrap();
    assert_eq!(h.store.trades().await.len(), 1);
    let row = h.store.address(address.id).await.unwrap();
    assert_eq!(row.last_seen_tx_hash.as_deref(), Some("0xbuy"));
}

#[tokio::test]
async fn test_reverted_swap_records_failed_trade() {
    let h = seeded().await;
    h.store.add_address("eth", WATCHED).await;
    script_pepe_buy(&h, WATCHED, "0xbuy");
    h.gateway.set_allowance(U256::from(1u64));
    h.gateway.set_receipt(TxReceipt {
        success: false,
        gas_used: 50_000,
        effective_gas_price: 1,
    });

    h.detector.run_pass().await.unwrap();

    let trades = h.store.trades().await;
    assert_eq!(trades[0].status(), TradeStatus::Failed);
    assert!(trades[0]
        .failure_reason
        .as_deref()
        .unwrap()
        .contains("reverted"));
}

#[tokio::test]
async fn test_missing_route_records_failed_trade() {
    let h = seeded().await;
    h.store.add_address("eth", WATCHED).await;
    h.gateway.set_latest(WATCHED, "0xnoroute", ts(1_700_000_000));
    h.gateway.set_legs(
        "0xnoroute",
        vec![leg("WETH", WETH, "0.5"), leg("SHIB", SHIB, "100")],
    );

    h.detector.run_pass().await.unwrap();

    let trades = h.store.trades().await;
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].status(), TradeStatus::Failed);
    assert!(h.gateway.submitted().is_empty());
}

#[tokio::test]
async fn test_transient_lookup_failure_leaves_address_for_next_pass() {
    let h = seeded().await;
    let address = h.store.add_address("eth", WATCHED).await;
    script_pepe_buy(&h, WATCHED, "0xbuy");
    h.gateway.fail_latest(true);

    let summary = h.detector.run_pass().await.unwrap().unwrap();
    assert_eq!(summary.errors, 1);
    assert!(h
        .store
        .address(address.id)
        .await
        .unwrap()
        .last_seen_tx_hash
        .is_none());
    assert!(h.store.trades().await.is_empty());

    h.gateway.fail_latest(false);
    h.detector.run_pass().await.unwrap();
    assert_eq!(h.store.trades().await.len(), 1);
}

#[tokio::test]
async fn test_unparsable_buy_amount_creates_no_trade() {
    let h = seeded().await;
    let address = h.store.add_address("eth", WATCHED).await;
    h.gateway.set_latest(WATCHED, "0xbad", ts(1_700_000_000));
    h.gateway
        .set_legs("0xbad", vec![leg("WETH", WETH, "0.5"), leg("PEPE", PEPE, "lots")]);

    let summary = h.detector.run_pass().await.unwrap().unwrap();

    assert_eq!(summary.errors, 1);
    assert!(h.store.trades().await.is_empty());
    let row = h.store.address(address.id).await.unwrap();
    assert_eq!(row.last_seen_tx_hash.as_deref(), Some("0xbad"));
}

#[tokio::test]
async fn test_no_enabled_wallets_aborts_pass() {
    let h = harness();
    let address = h.store.add_address("eth", WATCHED).await;
    script_pepe_buy(&h, WATCHED, "0xbuy");

    let result = h.detector.run_pass().await;

    assert!(matches!(result, Err(PipelineError::Configuration(_))));
    assert_eq!(h.gateway.latest_calls(), 0);
    assert!(h
        .store
        .address(address.id)
        .await
        .unwrap()
        .last_seen_tx_hash
        .is_none());
}

#[tokio::test]
async fn test_address_without_wallet_on_its_chain_is_skipped() {
    let h = seeded().await;
    let address = h.store.add_address("bsc", WATCHED).await;
    script_pepe_buy(&h, WATCHED, "0xbuy");

    h.detector.run_pass().await.unwrap();

    assert_eq!(h.gateway.latest_calls(), 0);
    assert!(h
        .store
        .address(address.id)
        .await
        .unwrap()
        .last_seen_tx_hash
        .is_none());
}

// ---------------------------------------------------------------------------
// Profit exit
// ---------------------------------------------------------------------------

/// Open trade with cost basis 1.00 ETH holding 1000 PEPE; exit gas
/// estimated at 200k gas * 100 gwei = 0.02 ETH.
async fn seeded_position() -> (common::Harness, uuid::Uuid) {
    let h = seeded().await;
    let trade = h.store.insert_trade(&open_trade(PEPE, WALLET)).await.unwrap();
    h.gateway.set_gas_price(100_000_000_000);
    h.gateway
        .set_quote(ETH_NATIVE, PEPE, units(500, 18), 18, 150_000);
    (h, trade.id)
}

#[tokio::test]
async fn test_profit_exit_fires_at_exact_target() {
    let (h, id) = seeded_position().await;
    h.gateway.set_quote(PEPE, ETH_NATIVE, units(204, 16), 18, 200_000);

    let summary = h.profit_exit.run_pass().await.unwrap().unwrap();
    assert_eq!(summary.sold, 1);

    let trade = h.store.get_trade(id).await.unwrap().unwrap();
    assert!(trade.principal_sold);
    assert_eq!(trade.principal_sold_tx_hash.as_deref(), Some("0xsubmitted2"));
    assert_eq!(trade.status(), TradeStatus::Open);

    let swaps = h.gateway.swaps_built();
    assert_eq!(swaps.len(), 1);
    assert_eq!(swaps[0].from_token, PEPE);
    assert_eq!(swaps[0].to_token, ETH_NATIVE);
    assert_eq!(swaps[0].amount, units(500, 18));
    assert_eq!(swaps[0].from_address, WALLET);

    // Sizing quote asks for exactly 2.04 ETH worth of the token.
    let quotes = h.gateway.quote_calls();
    assert!(quotes.contains(&(ETH_NATIVE.to_string(), PEPE.to_string(), units(204, 16))));
}

#[tokio::test]
async fn test_profit_exit_does_not_fire_just_below_target() {
    let (h, id) = seeded_position().await;
    let below = U256::from(2_039_999u64) * U256::from(10u64).pow(U256::from(12u64));
    h.gateway.set_quote(PEPE, ETH_NATIVE, below, 18, 200_000);

    let summary = h.profit_exit.run_pass().await.unwrap().unwrap();
    assert_eq!(summary.sold, 0);

    let trade = h.store.get_trade(id).await.unwrap().unwrap();
    assert!(!trade.principal_sold);
    assert!(h.gateway.submitted().is_empty());
}

#[tokio::test]
async fn test_profit_exit_sell_amount_capped_at_holding() {
    let (h, _) = seeded_position().await;
    h.gateway.set_quote(PEPE, ETH_NATIVE, units(10, 18), 18, 200_000);
    h.gateway
        .set_quote(ETH_NATIVE, PEPE, units(5_000, 18), 18, 150_000);

    h.profit_exit.run_pass().await.unwrap();

    let swaps = h.gateway.swaps_built();
    assert_eq!(swaps[0].amount, units(1_000, 18));
}

#[tokio::test]
async fn test_profit_exit_failure_leaves_trade_untouched() {
    let (h, id) = seeded_position().await;
    h.gateway.set_quote(PEPE, ETH_NATIVE, units(3, 18), 18, 200_000);
    h.gateway.fail_submit(true);

    let summary = h.profit_exit.run_pass().await.unwrap().unwrap();
    assert_eq!(summary.errors, 1);

    let trade = h.store.get_trade(id).await.unwrap().unwrap();
    assert!(!trade.principal_sold);
    assert_eq!(trade.status(), TradeStatus::Open);

    // Re-evaluated on the next pass.
    h.gateway.fail_submit(false);
    let summary = h.profit_exit.run_pass().await.unwrap().unwrap();
    assert_eq!(summary.sold, 1);
}

#[tokio::test]
async fn test_sold_principal_is_not_sold_twice() {
    let (h, _) = seeded_position().await;
    h.gateway.set_quote(PEPE, ETH_NATIVE, units(3, 18), 18, 200_000);

    h.profit_exit.run_pass().await.unwrap();
    let summary = h.profit_exit.run_pass().await.unwrap().unwrap();

    assert_eq!(summary.checked, 0);
    assert_eq!(h.gateway.swaps_built().len(), 1);
}

// ---------------------------------------------------------------------------
// Position close
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_position_closes_at_dust_threshold() {
    let h = seeded().await;
    let trade = h.store.insert_trade(&open_trade(PEPE, WALLET)).await.unwrap();
    h.gateway.set_balance(WALLET, PEPE, dec!(1000));
    h.gateway.set_quote(PEPE, ETH_USDC, U256::from(10_000_000u64), 6, 100_000);

    let summary = h.position_close.run_pass().await.unwrap().unwrap();
    assert_eq!(summary.closed, 1);

    let row = h.store.get_trade(trade.id).await.unwrap().unwrap();
    assert_eq!(row.status(), TradeStatus::Closed);
}

#[tokio::test]
async fn test_position_above_dust_stays_open() {
    let h = seeded().await;
    let trade = h.store.insert_trade(&open_trade(PEPE, WALLET)).await.unwrap();
    h.gateway.set_balance(WALLET, PEPE, dec!(1000));
    h.gateway.set_quote(PEPE, ETH_USDC, U256::from(10_010_000u64), 6, 100_000);

    h.position_close.run_pass().await.unwrap();

    let row = h.store.get_trade(trade.id).await.unwrap().unwrap();
    assert_eq!(row.status(), TradeStatus::Open);
}

#[tokio::test]
async fn test_holding_scaled_by_onchain_decimals() {
    let h = seeded().await;
    h.store.insert_trade(&open_trade(PEPE, WALLET)).await.unwrap();
    h.gateway.set_decimals(PEPE, 9);
    h.gateway.set_balance(WALLET, PEPE, dec!(2.5));
    h.gateway.set_quote(PEPE, ETH_USDC, U256::from(1u64), 6, 0);

    h.position_close.run_pass().await.unwrap();

    let quotes = h.gateway.quote_calls();
    assert_eq!(
        quotes[0],
        (PEPE.to_string(), ETH_USDC.to_string(), U256::from(2_500_000_000u64))
    );
}

#[tokio::test]
async fn test_absent_or_zero_holding_leaves_trade_open() {
    let h = seeded().await;
    let absent = h.store.insert_trade(&open_trade(PEPE, WALLET)).await.unwrap();
    let zero = h.store.insert_trade(&open_trade(SHIB, WALLET)).await.unwrap();
    h.gateway.set_balance(WALLET, SHIB, Decimal::ZERO);

    let summary = h.position_close.run_pass().await.unwrap().unwrap();
    assert_eq!(summary.closed, 0);

    for id in [absent.id, zero.id] {
        let row = h.store.get_trade(id).await.unwrap().unwrap();
        assert_eq!(row.status(), TradeStatus::Open);
    }
    assert!(h.gateway.quote_calls().is_empty());
}

#[tokio::test]
async fn test_closed_token_can_be_traded_again() {
    let h = seeded().await;
    let old = h.store.insert_trade(&open_trade(PEPE, WALLET)).await.unwrap();
    h.gateway.set_balance(WALLET, PEPE, dec!(1));
    h.gateway.set_quote(PEPE, ETH_USDC, U256::from(1_000_000u64), 6, 0);
    h.position_close.run_pass().await.unwrap();

    h.store.add_address("eth", WATCHED).await;
    script_pepe_buy(&h, WATCHED, "0xagain");
    h.detector.run_pass().await.unwrap();

    let trades = h.store.trades().await;
    assert_eq!(trades.len(), 2);
    assert_eq!(
        h.store.get_trade(old.id).await.unwrap().unwrap().status(),
        TradeStatus::Closed
    );
    assert_eq!(trades[1].status(), TradeStatus::Open);
}

// ---------------------------------------------------------------------------
// Monitors only see open trades
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_failed_trade_is_never_read_by_monitors() {
    let h = seeded().await;
    let mut failed = open_trade(PEPE, WALLET);
    failed.status = TradeStatus::Failed;
    failed.failure_reason = Some("swap reverted".into());
    let failed = h.store.insert_trade(&failed).await.unwrap();
    h.gateway.set_balance(WALLET, PEPE, dec!(1000));
    h.gateway.set_quote(PEPE, ETH_NATIVE, units(100, 18), 18, 0);
    h.gateway.set_quote(PEPE, ETH_USDC, U256::from(1u64), 6, 0);

    let exit = h.profit_exit.run_pass().await.unwrap().unwrap();
    let close = h.position_close.run_pass().await.unwrap().unwrap();

    assert_eq!(exit.checked, 0);
    assert_eq!(close.checked, 0);
    assert_eq!(h.gateway.balance_calls(), 0);
    assert!(h.gateway.quote_calls().is_empty());

    let row = h.store.get_trade(failed.id).await.unwrap().unwrap();
    assert_eq!(row.status(), TradeStatus::Failed);
    assert!(!row.principal_sold);
}
