//! Fuzzing suite for the launchpad engine
//!
//! Run with: cargo test --features fuzz
//! Increase cases: PROPTEST_CASES=1000 cargo test --features fuzz
//! Run deterministic only: cargo test --features fuzz fuzz_deterministic
//!
//! This suite implements:
//! - Snapshot-based "no mutation on error" checking
//! - Global invariants (conservation, migration lifecycle, event ordering)
//! - Action-based state machine fuzzer
//! - Focused curve property tests
//! - Deterministic seeded fuzzer with logging

#![cfg(feature = "fuzz")]

use launchpad::*;
use proptest::prelude::*;

const HOLDERS: [&str; 4] = ["alice", "bob", "carol", "dave"];

fn holder(i: usize) -> Address {
    Address::from(HOLDERS[i % HOLDERS.len()])
}

// ============================================================================
// SECTION 1: SNAPSHOT FOR "NO MUTATION ON ERROR" CHECKING
// ============================================================================

/// The whole world: launchpad plus the venue it migrates into
#[derive(Clone, Debug, PartialEq)]
struct Snapshot {
    launchpad: Launchpad,
    pool: SimulatedPool,
}

impl Snapshot {
    fn take(state: &FuzzState) -> Self {
        Snapshot {
            launchpad: state.launchpad.clone(),
            pool: state.pool.clone(),
        }
    }
}

fn assert_unchanged(state: &FuzzState, snapshot: &Snapshot, context: &str) {
    assert!(
        state.launchpad == snapshot.launchpad,
        "{}: launchpad mutated on error",
        context
    );
    assert!(state.pool == snapshot.pool, "{}: pool mutated on error", context);
}

// ============================================================================
// SECTION 2: GLOBAL INVARIANTS HELPER
// ============================================================================

fn assert_global_invariants(state: &FuzzState, context: &str) {
    let lp = &state.launchpad;
    let curve = lp.config().curve.curve();
    let threshold = lp.config().migration_threshold;

    for inst in lp.instruments() {
        let id = inst.id();
        let s = inst.curve_state();

        // Conservation of units
        let held: u128 = inst.ledger().holders().map(|(_, v)| v).sum();
        assert_eq!(held, s.supply_sold, "{}: {} balances != supply", context, id);
        assert_eq!(
            inst.ledger().total_supply(),
            s.supply_sold,
            "{}: {} ledger total != supply",
            context,
            id
        );

        // Conservation of capital
        let integral = curve.cost(0, s.supply_sold).unwrap();
        assert_eq!(
            integral + s.retained_remainder,
            s.capital_raised,
            "{}: {} capital != integral + retained",
            context,
            id
        );

        // Lifecycle
        assert_eq!(
            s.migrated,
            s.capital_raised >= threshold,
            "{}: {} migrated flag disagrees with capital",
            context,
            id
        );
        assert_eq!(
            s.migrated,
            inst.migration().is_some(),
            "{}: {} migrated flag disagrees with record",
            context,
            id
        );
        assert_eq!(
            s.migrated,
            state.pool.position_for(id).is_some(),
            "{}: {} migrated flag disagrees with pool",
            context,
            id
        );

        let migrations = lp
            .events()
            .iter()
            .filter(|r| matches!(&r.event, LaunchEvent::Migrated(m) if m.instrument == id))
            .count();
        assert!(migrations <= 1, "{}: {} migrated {} times", context, id, migrations);
    }

    assert!(
        lp.events().windows(2).all(|w| w[0].seq < w[1].seq),
        "{}: event sequence not strictly increasing",
        context
    );
}

// ============================================================================
// SECTION 3: PARAMETER REGIMES
// ============================================================================

/// Flat price, low threshold: migrations happen often
fn config_regime_a() -> LaunchpadConfig {
    LaunchpadConfig {
        curve: CurveParams::new(3, 0),
        migration_threshold: 20_000,
        remainder_policy: RemainderPolicy::Retain,
        ..LaunchpadConfig::default()
    }
}

/// Steep slope, refund policy, high threshold
fn config_regime_b() -> LaunchpadConfig {
    LaunchpadConfig {
        curve: CurveParams::new(1, 7),
        migration_threshold: 500_000,
        remainder_policy: RemainderPolicy::Refund,
        ..LaunchpadConfig::default()
    }
}

// ============================================================================
// SECTION 4: ACTION ENUM AND STRATEGIES
// ============================================================================

#[derive(Clone, Debug)]
enum Action {
    Create { symbol: u8 },
    Buy { inst: u32, who: usize, payment: u128, min_out: u128 },
    Sell { inst: u32, who: usize, amount: u128 },
    Transfer { inst: u32, from: usize, to: usize, amount: u128 },
    Approve { inst: u32, owner: usize, spender: usize, amount: u128 },
    TransferFrom { inst: u32, spender: usize, from: usize, to: usize, amount: u128 },
    SetVenueReject { reject: bool },
}

/// Strategy biased toward instruments that exist (ids 0..3), with some
/// unknown ids mixed in
fn action_strategy() -> impl Strategy<Value = Action> {
    let inst = prop_oneof![9 => 0u32..3, 1 => 3u32..8];
    let who = 0usize..HOLDERS.len();

    prop_oneof![
        1 => (0u8..6).prop_map(|symbol| Action::Create { symbol }),
        10 => (inst.clone(), who.clone(), 0u128..6_000, prop_oneof![9 => Just(0u128), 1 => 0u128..3_000])
            .prop_map(|(inst, who, payment, min_out)| Action::Buy { inst, who, payment, min_out }),
        6 => (inst.clone(), who.clone(), 0u128..1_500)
            .prop_map(|(inst, who, amount)| Action::Sell { inst, who, amount }),
        4 => (inst.clone(), who.clone(), who.clone(), 0u128..1_000)
            .prop_map(|(inst, from, to, amount)| Action::Transfer { inst, from, to, amount }),
        2 => (inst.clone(), who.clone(), who.clone(), 0u128..1_000)
            .prop_map(|(inst, owner, spender, amount)| Action::Approve { inst, owner, spender, amount }),
        2 => (inst, who.clone(), who.clone(), who, 0u128..1_000)
            .prop_map(|(inst, spender, from, to, amount)| Action::TransferFrom { inst, spender, from, to, amount }),
        1 => any::<bool>().prop_map(|reject| Action::SetVenueReject { reject }),
    ]
}

// ============================================================================
// SECTION 5: STATE MACHINE FUZZER
// ============================================================================

struct FuzzState {
    launchpad: Launchpad,
    pool: SimulatedPool,
}

impl FuzzState {
    fn new(config: LaunchpadConfig) -> Self {
        let mut launchpad = Launchpad::new(config).unwrap();
        let creator = Address::from("creator");
        launchpad.create(&creator, "Pepe Coin", "PEPE").unwrap();
        launchpad.create(&creator, "Doge 2.0", "DOG2").unwrap();
        FuzzState {
            launchpad,
            pool: SimulatedPool::new(),
        }
    }

    /// Execute an action and verify invariants
    fn execute(&mut self, action: &Action, step: usize) {
        let context = format!("Step {} ({:?})", step, action);
        let snapshot = Snapshot::take(self);
        let events_before = self.launchpad.events().len();

        let result: Result<()> = match action {
            Action::Create { symbol } => {
                let before = self.launchpad.len();
                let result = self.launchpad.create(
                    &Address::from("creator"),
                    &format!("Coin {}", symbol),
                    &format!("C{}", symbol),
                );
                if let Ok(id) = &result {
                    assert_eq!(id.index(), before, "{}: id not dense", context);
                    assert_eq!(
                        self.launchpad.instrument(*id).unwrap().created_seq(),
                        self.launchpad.events().last().unwrap().seq,
                        "{}: created_seq mismatch",
                        context
                    );
                }
                result.map(|_| ())
            }

            Action::Buy { inst, who, payment, min_out } => {
                let id = InstrumentId::new(*inst);
                let quote = self.launchpad.quote_payment(id, *payment);
                let result = self.launchpad.buy_with_min_out(
                    &mut self.pool,
                    id,
                    &holder(*who),
                    *payment,
                    *min_out,
                );
                if let Ok(receipt) = &result {
                    // The preview is exactly what the trade does
                    let quote = quote.unwrap();
                    assert_eq!(receipt.tokens_minted, quote.tokens, "{}: quote tokens", context);
                    assert_eq!(receipt.cost, quote.cost, "{}: quote cost", context);
                    assert!(receipt.tokens_minted >= *min_out, "{}: slippage", context);
                    assert_eq!(
                        receipt.migration.is_some(),
                        quote.triggers_migration,
                        "{}: migration flag",
                        context
                    );
                }
                result.map(|_| ())
            }

            Action::Sell { inst, who, amount } => {
                let id = InstrumentId::new(*inst);
                let quote = self.launchpad.quote_sell(id, *amount);
                let result = self.launchpad.sell(id, &holder(*who), *amount);
                if let Ok(receipt) = &result {
                    assert_eq!(Ok(receipt.refund), quote, "{}: sell quote", context);
                }
                result.map(|_| ())
            }

            Action::Transfer { inst, from, to, amount } => {
                let id = InstrumentId::new(*inst);
                let supply = self.launchpad.total_supply(id).ok();
                let result = self
                    .launchpad
                    .transfer(id, &holder(*from), &holder(*to), *amount);
                if result.is_ok() {
                    assert_eq!(self.launchpad.total_supply(id).ok(), supply, "{}: supply", context);
                }
                result
            }

            Action::Approve { inst, owner, spender, amount } => {
                let id = InstrumentId::new(*inst);
                let result = self
                    .launchpad
                    .approve(id, &holder(*owner), &holder(*spender), *amount);
                if result.is_ok() {
                    assert_eq!(
                        self.launchpad.allowance(id, &holder(*owner), &holder(*spender)).unwrap(),
                        *amount,
                        "{}: allowance not set",
                        context
                    );
                }
                result
            }

            Action::TransferFrom { inst, spender, from, to, amount } => {
                let id = InstrumentId::new(*inst);
                let allowance = self
                    .launchpad
                    .allowance(id, &holder(*from), &holder(*spender))
                    .unwrap_or(0);
                let result = self.launchpad.transfer_from(
                    id,
                    &holder(*spender),
                    &holder(*from),
                    &holder(*to),
                    *amount,
                );
                if result.is_ok() {
                    assert_eq!(
                        self.launchpad.allowance(id, &holder(*from), &holder(*spender)).unwrap(),
                        allowance - amount,
                        "{}: allowance not consumed",
                        context
                    );
                }
                result
            }

            Action::SetVenueReject { reject } => {
                self.pool.set_reject_all(*reject);
                Ok(())
            }
        };

        match result {
            Ok(()) => {
                if !matches!(action, Action::SetVenueReject { .. }) {
                    assert!(
                        self.launchpad.events().len() > events_before,
                        "{}: success without an event",
                        context
                    );
                }
            }
            Err(_) => {
                assert_unchanged(self, &snapshot, &context);
                assert_eq!(self.launchpad.events().len(), events_before, "{}: event on error", context);
            }
        }

        assert_global_invariants(self, &context);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn fuzz_state_machine_regime_a(
        actions in prop::collection::vec(action_strategy(), 50..150)
    ) {
        let mut state = FuzzState::new(config_regime_a());
        for (step, action) in actions.iter().enumerate() {
            state.execute(action, step);
        }
    }

    #[test]
    fn fuzz_state_machine_regime_b(
        actions in prop::collection::vec(action_strategy(), 50..150)
    ) {
        let mut state = FuzzState::new(config_regime_b());
        for (step, action) in actions.iter().enumerate() {
            state.execute(action, step);
        }
    }

    #[test]
    fn fuzz_persisted_round_trip(
        actions in prop::collection::vec(action_strategy(), 10..80)
    ) {
        let mut state = FuzzState::new(config_regime_a());
        for (step, action) in actions.iter().enumerate() {
            state.execute(action, step);
        }
        let snapshot = state.launchpad.to_persisted();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: PersistedLaunchpad = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(Launchpad::from_persisted(parsed).unwrap(), state.launchpad);
    }
}

// ============================================================================
// SECTION 6: CURVE PROPERTY FUZZ TESTS (FOCUSED)
// ============================================================================

fn curve_strategy() -> impl Strategy<Value = (u128, u128)> {
    (0u128..1_000, 0u128..1_000).prop_filter("flat zero curve", |(a, b)| *a > 0 || *b > 0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // 1. cost is additive over adjacent ranges
    #[test]
    fn fuzz_prop_cost_additive(
        (a, b) in curve_strategy(),
        s0 in 0u128..1_000_000,
        n1 in 0u128..10_000,
        n2 in 0u128..10_000,
    ) {
        let curve = CurveParams::new(a, b).curve();
        let whole = curve.cost(s0, s0 + n1 + n2).unwrap();
        let split = curve.cost(s0, s0 + n1).unwrap() + curve.cost(s0 + n1, s0 + n1 + n2).unwrap();
        prop_assert_eq!(whole, split);
    }

    // 2. price never decreases
    #[test]
    fn fuzz_prop_price_monotone(
        (a, b) in curve_strategy(),
        s1 in 0u128..u64::MAX as u128,
        ds in 0u128..1_000_000,
    ) {
        let curve = CurveParams::new(a, b).curve();
        prop_assert!(curve.price_at(s1).unwrap() <= curve.price_at(s1 + ds).unwrap());
    }

    // 3. fill is maximal: one more unit would exceed the payment
    #[test]
    fn fuzz_prop_fill_maximal(
        (a, b) in curve_strategy(),
        supply in 0u128..1_000_000,
        payment in 1u128..10_000_000,
    ) {
        let curve = CurveParams::new(a, b).curve();
        match curve.fill_for_payment(supply, payment) {
            Ok(fill) => {
                prop_assert!(fill.cost <= payment);
                prop_assert_eq!(fill.cost + fill.remainder, payment);
                let next = curve.cost(supply, supply + fill.tokens + 1).unwrap();
                prop_assert!(next > payment);
            }
            Err(_) => {
                prop_assert!(curve.quote_buy(supply, 1).unwrap() > payment);
            }
        }
    }

    // 4. buy then sell of the same units is a no-op under refund
    #[test]
    fn fuzz_prop_buy_sell_no_op_under_refund(
        (a, b) in curve_strategy(),
        payment in 1_000u128..1_000_000,
    ) {
        let config = LaunchpadConfig {
            curve: CurveParams::new(a, b),
            migration_threshold: u128::MAX,
            remainder_policy: RemainderPolicy::Refund,
            ..LaunchpadConfig::default()
        };
        let mut lp = Launchpad::new(config).unwrap();
        let mut pool = SimulatedPool::new();
        let alice = Address::from("alice");
        let id = lp.create(&alice, "Pepe Coin", "PEPE").unwrap();

        if let Ok(bought) = lp.buy(&mut pool, id, &alice, payment) {
            let sold = lp.sell(id, &alice, bought.tokens_minted).unwrap();
            prop_assert_eq!(sold.refund + bought.refunded, payment);
            prop_assert_eq!(lp.get_curve_state(id).unwrap(), CurveState::default());
        }
    }

    // 5. unit-priced curves: additive, non-decreasing, maximal fills
    #[test]
    fn fuzz_prop_unit_curve(
        (a, b) in curve_strategy(),
        unit in 1u128..1_000_000,
        s0 in 0u128..1_000_000_000,
        n in 1u128..10_000_000,
        payment in 1u128..100_000_000,
    ) {
        let curve = CurveParams::new(a, b).with_unit(unit).curve();
        let split = curve.cost(s0, s0 + n / 2).unwrap() + curve.cost(s0 + n / 2, s0 + n).unwrap();
        prop_assert_eq!(curve.cost(s0, s0 + n).unwrap(), split);
        prop_assert!(curve.integral(s0).unwrap() <= curve.integral(s0 + n).unwrap());
        prop_assert!(curve.price_at(s0).unwrap() <= curve.price_at(s0 + n).unwrap());

        if let Ok(fill) = curve.fill_for_payment(s0, payment) {
            prop_assert!(fill.cost <= payment);
            prop_assert!(curve.quote_buy(s0, fill.tokens + 1).unwrap() > payment);
        }
    }
}

// ============================================================================
// SECTION 7: DETERMINISTIC SEEDED FUZZER
// ============================================================================

/// xorshift64 PRNG for deterministic randomness
struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        Rng { state: if seed == 0 { 1 } else { seed } }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn u128(&mut self, lo: u128, hi: u128) -> u128 {
        if lo >= hi { return lo; }
        lo + ((self.next() as u128) % (hi - lo + 1))
    }

    fn u32(&mut self, lo: u32, hi: u32) -> u32 {
        if lo >= hi { return lo; }
        lo + ((self.next() % (hi - lo + 1) as u64) as u32)
    }

    fn usize(&mut self, lo: usize, hi: usize) -> usize {
        if lo >= hi { return lo; }
        lo + ((self.next() as usize) % (hi - lo + 1))
    }

    fn bool(&mut self) -> bool {
        self.next() % 2 == 0
    }
}

fn random_action(rng: &mut Rng) -> Action {
    let who = HOLDERS.len() - 1;
    match rng.usize(0, 25) {
        0 => Action::Create { symbol: rng.u32(0, 5) as u8 },
        1..=10 => Action::Buy {
            inst: rng.u32(0, 3),
            who: rng.usize(0, who),
            payment: rng.u128(0, 6_000),
            min_out: if rng.usize(0, 9) == 0 { rng.u128(0, 3_000) } else { 0 },
        },
        11..=16 => Action::Sell {
            inst: rng.u32(0, 3),
            who: rng.usize(0, who),
            amount: rng.u128(0, 1_500),
        },
        17..=20 => Action::Transfer {
            inst: rng.u32(0, 3),
            from: rng.usize(0, who),
            to: rng.usize(0, who),
            amount: rng.u128(0, 1_000),
        },
        21..=22 => Action::Approve {
            inst: rng.u32(0, 3),
            owner: rng.usize(0, who),
            spender: rng.usize(0, who),
            amount: rng.u128(0, 1_000),
        },
        23..=24 => Action::TransferFrom {
            inst: rng.u32(0, 3),
            spender: rng.usize(0, who),
            from: rng.usize(0, who),
            to: rng.usize(0, who),
            amount: rng.u128(0, 1_000),
        },
        _ => Action::SetVenueReject { reject: rng.bool() },
    }
}

fn run_deterministic_fuzzer(config: LaunchpadConfig, regime_name: &str, seeds: std::ops::Range<u64>, steps: usize) {
    for seed in seeds {
        let mut rng = Rng::new(seed);
        let mut state = FuzzState::new(config.clone());

        // Track last N actions for repro
        let mut action_history: Vec<String> = Vec::with_capacity(10);

        for step in 0..steps {
            let action = random_action(&mut rng);
            let desc = format!("{:?}", action);

            if action_history.len() >= 10 {
                action_history.remove(0);
            }
            action_history.push(desc.clone());

            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                state.execute(&action, step);
            }));

            if result.is_err() {
                eprintln!("\n=== DETERMINISTIC FUZZER FAILURE ===");
                eprintln!("Regime: {}", regime_name);
                eprintln!("Seed: {}", seed);
                eprintln!("Step: {}", step);
                eprintln!("Action: {}", desc);
                eprintln!("\nLast 10 actions:");
                for (i, act) in action_history.iter().enumerate() {
                    eprintln!("  {}: {}", step.saturating_sub(9) + i, act);
                }
                eprintln!("\nTo reproduce: run with seed={}, stop at step={}", seed, step);
                panic!("Deterministic fuzzer failed - see above for repro");
            }
        }
    }
}

#[test]
fn fuzz_deterministic_regime_a() {
    run_deterministic_fuzzer(config_regime_a(), "A (flat, retain)", 1..201, 200);
}

#[test]
fn fuzz_deterministic_regime_b() {
    run_deterministic_fuzzer(config_regime_b(), "B (sloped, refund)", 1..201, 200);
}

// Extended deterministic test with more seeds
#[test]
#[ignore] // Run with: cargo test --features fuzz fuzz_deterministic_extended -- --ignored
fn fuzz_deterministic_extended() {
    run_deterministic_fuzzer(config_regime_a(), "A extended", 1..2001, 500);
    run_deterministic_fuzzer(config_regime_b(), "B extended", 1..2001, 500);
}
