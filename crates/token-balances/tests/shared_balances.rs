use {
    alloy_primitives::{Address, U256},
    anyhow::anyhow,
    async_trait::async_trait,
    bigdecimal::BigDecimal,
    std::{
        collections::VecDeque,
        sync::{
            Arc,
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    },
    token_balances::{
        BatchBalanceFetching,
        BatchQuery,
        BatchResponse,
        Configuration,
        CurrencyMetadata,
        Denom,
        NetworkId,
        Registry,
        StaticCurrencies,
        TokenBalanceEntry,
        config::Network,
    },
    tokio::sync::Semaphore,
};

const OWNER: &str = "0x95222290DD7278Aa3Ddd389Cc1E1d165CC4BAfe5";

/// Fetcher whose requests only complete once the test releases them.
struct GatedFetcher {
    calls: AtomicUsize,
    gate: Semaphore,
    outcomes: Mutex<VecDeque<anyhow::Result<BatchResponse>>>,
}

impl GatedFetcher {
    fn new(outcomes: impl IntoIterator<Item = anyhow::Result<BatchResponse>>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
            outcomes: Mutex::new(outcomes.into_iter().collect()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl BatchBalanceFetching for GatedFetcher {
    async fn fetch_balances(&self, _: &BatchQuery) -> anyhow::Result<BatchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.acquire().await.unwrap().forget();
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected fetch")
    }
}

fn mainnet() -> NetworkId {
    "eip155:1".parse().unwrap()
}

fn base() -> NetworkId {
    "eip155:8453".parse().unwrap()
}

fn token(last_byte: u8) -> Address {
    Address::with_last_byte(last_byte)
}

fn denom(last_byte: u8) -> String {
    Denom::Erc20(token(last_byte)).to_string()
}

fn config() -> Configuration {
    Configuration {
        networks: vec![
            Network {
                id: mainnet(),
                endpoint: "https://eth.example.org/v2/key".parse().unwrap(),
            },
            Network {
                id: base(),
                endpoint: "https://base.example.org/v2/key".parse().unwrap(),
            },
        ],
        ..Default::default()
    }
    .validate()
    .unwrap()
}

fn currencies(tokens: impl IntoIterator<Item = u8>) -> Arc<StaticCurrencies> {
    let currencies = Arc::new(StaticCurrencies::new());
    for last_byte in tokens {
        currencies.insert(
            mainnet(),
            CurrencyMetadata {
                denom: Denom::Erc20(token(last_byte)),
                symbol: format!("TKN{last_byte}"),
                decimals: 6,
            },
        );
    }
    currencies
}

fn entry(last_byte: u8, raw_balance: Option<u64>) -> TokenBalanceEntry {
    TokenBalanceEntry {
        contract: token(last_byte),
        raw_balance: raw_balance.map(U256::from),
        error: None,
    }
}

/// Lets spawned tasks run until `condition` holds.
async fn settle(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            // give the remaining tasks a chance to join as well
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

#[tokio::test]
async fn concurrent_fetches_share_one_request() {
    observe::tracing::initialize_reentrant(&observe::Config::default().with_env_filter("debug"));

    let fetcher = GatedFetcher::new([Ok(BatchResponse {
        entries: vec![entry(1, Some(1_000_000))],
        continuation: None,
    })]);
    let registry = Registry::new(config(), fetcher.clone(), currencies(1..=2));

    let views: Vec<_> = (0..10)
        .map(|i| registry.view(&mainnet(), OWNER, &denom(1 + i % 2)).unwrap())
        .collect();
    let watched = registry.view(&mainnet(), OWNER, &denom(1)).unwrap();
    let tasks: Vec<_> = views
        .into_iter()
        .map(|view| tokio::spawn(async move { view.fetch().await }))
        .collect();

    settle(|| fetcher.calls() == 1).await;
    assert!(watched.is_fetching());
    fetcher.release();

    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(fetcher.calls(), 1);
    assert!(!watched.is_fetching());
    assert_eq!(watched.balance().unwrap().to_decimal(), BigDecimal::from(1));
}

#[tokio::test]
async fn failed_fetch_reaches_every_waiter_and_next_call_retries() {
    let fetcher = GatedFetcher::new([
        Err(anyhow!("503 service unavailable")),
        Ok(BatchResponse::default()),
    ]);
    let registry = Registry::new(config(), fetcher.clone(), currencies([1]));
    let first = registry.view(&mainnet(), OWNER, &denom(1)).unwrap();
    let second = registry.view(&mainnet(), OWNER, &denom(2)).unwrap();

    let tasks = [
        tokio::spawn(async move { first.fetch().await }),
        tokio::spawn(async move { second.fetch().await }),
    ];
    settle(|| fetcher.calls() == 1).await;
    fetcher.release();

    let [first, second] = tasks;
    let first = first.await.unwrap().unwrap_err();
    let second = second.await.unwrap().unwrap_err();
    assert_eq!(first, second);
    assert_eq!(fetcher.calls(), 1);

    let third = registry.view(&mainnet(), OWNER, &denom(1)).unwrap();
    assert_eq!(third.last_error(), Some(first));
    fetcher.release();
    third.fetch().await.unwrap();
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(third.last_error(), None);
}

#[tokio::test]
async fn caller_holding_a_finished_fetch_does_not_block_new_fetches() {
    let fetcher = GatedFetcher::new([
        Err(anyhow!("503 service unavailable")),
        Ok(BatchResponse::default()),
    ]);
    let registry = Registry::new(config(), fetcher.clone(), currencies([1]));
    let view = registry.view(&mainnet(), OWNER, &denom(1)).unwrap();

    // starts the fetch, then never gets polled again until the end
    let mut lingering = Box::pin(view.fetch());
    assert!(futures::poll!(&mut lingering).is_pending());
    fetcher.release();
    let err = view.fetch().await.unwrap_err();
    assert!(!view.is_fetching());

    fetcher.release();
    view.fetch().await.unwrap();
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(view.last_error(), None);

    assert_eq!(lingering.await.unwrap_err(), err);
}

#[tokio::test]
async fn records_fetch_metrics() {
    let fetcher = GatedFetcher::new([Ok(BatchResponse {
        entries: vec![entry(1, Some(5)), entry(2, Some(0))],
        continuation: None,
    })]);
    let registry = Registry::new(config(), fetcher.clone(), currencies([]));
    let first = registry.view(&base(), OWNER, &denom(1)).unwrap();
    let second = registry.view(&base(), OWNER, &denom(2)).unwrap();

    let mut started = Box::pin(first.fetch());
    assert!(futures::poll!(&mut started).is_pending());
    fetcher.release();
    second.fetch().await.unwrap();
    started.await.unwrap();

    let metrics = observe::metrics::encode(observe::metrics::get_registry()).unwrap();
    for line in [
        r#"token_balances_batch_fetches{network="eip155:8453",result="success"} 1"#,
        r#"token_balances_joined_fetches{network="eip155:8453"} 1"#,
        r#"token_balances_discovered_tokens{network="eip155:8453"} 1"#,
    ] {
        assert!(metrics.contains(line), "{line} missing from\n{metrics}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_views_share_one_parent() {
    let registry = Arc::new(Registry::new(
        config(),
        GatedFetcher::new([]),
        currencies([]),
    ));

    let tasks: Vec<_> = (0..32u8)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .view(&mainnet(), OWNER, &denom(i))
                    .unwrap()
                    .parent()
                    .clone()
            })
        })
        .collect();

    let mut parents = Vec::new();
    for task in tasks {
        parents.push(task.await.unwrap());
    }
    assert_eq!(registry.len(), 1);
    assert!(parents.iter().all(|parent| Arc::ptr_eq(parent, &parents[0])));
}

#[tokio::test]
async fn derives_views_and_registers_discovered_tokens() {
    let fetcher = GatedFetcher::new([Ok(BatchResponse {
        entries: vec![entry(1, Some(1_000_000)), entry(3, Some(42)), entry(4, Some(0))],
        continuation: Some("next".into()),
    })]);
    let currencies = currencies(1..=2);
    let registry = Registry::new(config(), fetcher.clone(), currencies.clone());

    let held = registry.view(&mainnet(), OWNER, &denom(1)).unwrap();
    let absent = registry.view(&mainnet(), OWNER, &denom(2)).unwrap();
    // unknown before the fetch
    assert!(!held.balance().unwrap().is_ready());

    fetcher.release();
    let response = held.wait_response().await.unwrap().unwrap();
    assert_eq!(response.entries.len(), 3);

    let balance = held.balance().unwrap();
    assert!(balance.is_ready());
    assert_eq!(balance.to_decimal(), BigDecimal::from(1));
    assert_eq!(balance.to_string(), "1 TKN1");

    let balance = absent.balance().unwrap();
    assert!(!balance.is_ready());
    assert!(balance.is_zero());

    // token 3 was seen with a positive balance but has no metadata yet,
    // token 4 has a zero balance and stays unknown to the catalog
    assert_eq!(
        currencies.unknown(&mainnet()),
        [Denom::Erc20(token(3))].into_iter().collect()
    );

    // already cached, no further request
    held.wait_response().await.unwrap();
    assert_eq!(fetcher.calls(), 1);
}
