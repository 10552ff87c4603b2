use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Wallet {
    connected: bool,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Transaction {
    status: String,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Session {
    wallet: Wallet,
    transaction: Transaction,
}

#[derive(Debug, Deserialize)]
struct Habit {
    id: u64,
    name: String,
    color_index: u64,
}

#[derive(Debug, Deserialize)]
struct Habits {
    habits: Vec<Habit>,
    selected_habit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Month {
    year: i32,
    month: u32,
    is_current_month: bool,
    can_go_next: bool,
}

#[derive(Debug, Deserialize)]
struct Day {
    is_today: bool,
    status: String,
    can_check_in: bool,
}

#[derive(Debug, Deserialize)]
struct Stats {
    total_checked: u32,
    current_streak: u32,
}

#[derive(Debug, Deserialize)]
struct Calendar {
    month: Month,
    days: Vec<Day>,
    stats: Stats,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::Once;
    use std::sync::atomic::{AtomicI32, Ordering};

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path(stem: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("habit_tracker_{stem}_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/session")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_habit_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", unique_data_path("ledger"))
        .env("HABITS_PATH", unique_data_path("habits"))
        .env("HABIT_REGISTRY", "contract")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

/// Each test owns one account so state left by other tests does not leak in.
async fn connect(client: &Client, server: &TestServer, address: &str) -> Session {
    let response = client
        .post(format!("{}/api/wallet/connect", server.base_url))
        .json(&json!({ "address": address }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

async fn calendar(client: &Client, server: &TestServer) -> Calendar {
    client
        .post(format!("{}/api/calendar/today", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_check_in_marks_today_once() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let session = connect(&client, &server, "0x1111111111111111111111111111111111111111").await;
    assert!(session.wallet.connected);

    let habits: Habits = client
        .post(format!("{}/api/habits", server.base_url))
        .json(&json!({ "name": "Morning run", "color_index": 2 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(habits.habits.len(), 1);
    assert_eq!(habits.habits[0].name, "Morning run");
    assert_eq!(habits.habits[0].color_index, 2);
    assert_eq!(habits.selected_habit, Some(habits.habits[0].id));

    let before = calendar(&client, &server).await;
    let today = before.days.iter().find(|day| day.is_today).unwrap();
    assert_eq!(today.status, "unchecked");
    assert!(today.can_check_in);

    let response = client
        .post(format!("{}/api/check-in", server.base_url))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let after = calendar(&client, &server).await;
    let today = after.days.iter().find(|day| day.is_today).unwrap();
    assert_eq!(today.status, "checked");
    assert!(!today.can_check_in);
    assert_eq!(after.stats.total_checked, 1);
    assert_eq!(after.stats.current_streak, 1);

    let response = client
        .post(format!("{}/api/check-in", server.base_url))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response.text().await.unwrap(), "Already checked in today!");

    let again = calendar(&client, &server).await;
    assert_eq!(again.stats.total_checked, 1);

    let session: Session = client
        .get(format!("{}/api/session", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session.transaction.status, "error");
    assert_eq!(session.transaction.message.as_deref(), Some("Already checked in today!"));
}

#[tokio::test]
async fn http_habit_edit_and_delete() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    connect(&client, &server, "0x2222222222222222222222222222222222222222").await;

    for name in ["Read", "Stretch"] {
        let response = client
            .post(format!("{}/api/habits", server.base_url))
            .json(&json!({ "name": name, "color_index": 0 }))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    let habits: Habits = client
        .put(format!("{}/api/habits/0", server.base_url))
        .json(&json!({ "name": "Read 30 min", "color_index": 6 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(habits.habits[0].name, "Read 30 min");
    assert_eq!(habits.habits[0].color_index, 6);

    let habits: Habits = client
        .delete(format!("{}/api/habits/0", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(habits.habits.len(), 1);
    assert_eq!(habits.habits[0].id, 1);
    assert_eq!(habits.selected_habit, Some(1));

    let response = client
        .post(format!("{}/api/habits", server.base_url))
        .json(&json!({ "name": "Paint", "color_index": 8 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_wallet_gates_writes() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let session: Session = client
        .post(format!("{}/api/wallet/disconnect", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!session.wallet.connected);
    assert!(session.wallet.address.is_none());

    let response = client
        .post(format!("{}/api/check-in", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .post(format!("{}/api/wallet/connect", server.base_url))
        .json(&json!({ "address": "0x123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let habits: Habits = client
        .get(format!("{}/api/habits", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(habits.habits.is_empty());
}

#[tokio::test]
async fn http_month_navigation_stops_at_current_month() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let current = calendar(&client, &server).await;
    assert!(current.month.is_current_month);
    assert!(!current.month.can_go_next);

    let next: Calendar = client
        .post(format!("{}/api/calendar/next", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!((next.month.year, next.month.month), (current.month.year, current.month.month));

    let previous: Calendar = client
        .post(format!("{}/api/calendar/prev", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!previous.month.is_current_month);
    assert!(previous.month.can_go_next);
    if current.month.month == 1 {
        assert_eq!((previous.month.year, previous.month.month), (current.month.year - 1, 12));
    } else {
        assert_eq!(previous.month.month, current.month.month - 1);
    }

    calendar(&client, &server).await;
}
