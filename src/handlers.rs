use crate::calendar::{DayIndex, build_month, day_index};
use crate::contract::format_ether;
use crate::errors::AppError;
use crate::models::{
    Address, CalendarResponse, CheckInRequest, CheckInResponse, ConnectRequest, ContractInfo, DayView, Habit,
    HabitForm, HabitView, HabitsResponse, SessionResponse,
};
use crate::palette::HabitColor;
use crate::registry::RegistryBackend;
use crate::state::AppState;
use crate::stats::{DayStatus, build_month_stats, evaluated_days, fetch_day_statuses};
use crate::transaction::{TransactionView, TxKind};
use crate::ui::render_index;
use axum::{
    Json,
    extract::{Path, State},
    response::Html,
};
use chrono::{Local, NaiveDate};
use std::time::Instant;
use tracing::{info, warn};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.config))
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(session_response(&state).await)
}

pub async fn connect_wallet(
    State(state): State<AppState>,
    Json(payload): Json<ConnectRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let address = Address::parse(&payload.address).map_err(|err| {
        warn!("wallet connection rejected: {err}");
        AppError::bad_request(format!("Wallet connection failed: {err}"))
    })?;
    state.session.lock().await.connect(address);
    Ok(Json(session_response(&state).await))
}

pub async fn disconnect_wallet(State(state): State<AppState>) -> Json<SessionResponse> {
    state.session.lock().await.disconnect();
    Json(session_response(&state).await)
}

pub async fn list_habits(State(state): State<AppState>) -> Result<Json<HabitsResponse>, AppError> {
    Ok(Json(habits_response(&state).await?))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Json(form): Json<HabitForm>,
) -> Result<Json<HabitsResponse>, AppError> {
    let (name, color) = validate_form(&form)?;
    let account = connected_account(&state).await?;

    let created = match state.registry.backend() {
        RegistryBackend::Contract => {
            let caller = account.clone();
            state
                .submit_write(TxKind::CreateHabit, move |contract| async move {
                    contract.create_habit(&caller, &name, color.index()).await
                })
                .await?;
            // New slots are appended, so the highest live id is the new habit.
            state
                .registry
                .load(Some(&account))
                .await?
                .iter()
                .map(|habit| habit.id)
                .max()
        }
        RegistryBackend::Local => Some(state.registry.local().create(&account, &name, color).await?.id),
    };

    if let Some(id) = created {
        info!(account = %account, habit_id = id, "habit created");
        state.session.lock().await.select(id);
    }
    Ok(Json(habits_response(&state).await?))
}

pub async fn update_habit(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(form): Json<HabitForm>,
) -> Result<Json<HabitsResponse>, AppError> {
    let (name, color) = validate_form(&form)?;
    let account = connected_account(&state).await?;

    match state.registry.backend() {
        RegistryBackend::Contract => {
            state
                .submit_write(TxKind::UpdateHabit, move |contract| async move {
                    contract.update_habit(&account, id, &name, color.index()).await
                })
                .await?;
        }
        RegistryBackend::Local => {
            state.registry.local().update(&account, id, &name, color).await?;
        }
    }
    Ok(Json(habits_response(&state).await?))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<HabitsResponse>, AppError> {
    let account = connected_account(&state).await?;

    match state.registry.backend() {
        RegistryBackend::Contract => {
            state
                .submit_write(TxKind::DeleteHabit, move |contract| async move {
                    contract.delete_habit(&account, id).await
                })
                .await?;
        }
        RegistryBackend::Local => {
            state.registry.local().delete(&account, id).await?;
        }
    }
    Ok(Json(habits_response(&state).await?))
}

pub async fn select_habit(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<HabitsResponse>, AppError> {
    let (_, habits) = load_habits(&state).await?;
    if !habits.iter().any(|habit| habit.id == id) {
        return Err(AppError::not_found(format!("habit {id} not found")));
    }
    state.session.lock().await.select(id);
    Ok(Json(habits_response(&state).await?))
}

pub async fn get_calendar(State(state): State<AppState>) -> Result<Json<CalendarResponse>, AppError> {
    Ok(Json(build_calendar(&state, today()).await?))
}

pub async fn previous_month(State(state): State<AppState>) -> Result<Json<CalendarResponse>, AppError> {
    state.session.lock().await.cursor.previous();
    Ok(Json(build_calendar(&state, today()).await?))
}

pub async fn next_month(State(state): State<AppState>) -> Result<Json<CalendarResponse>, AppError> {
    let today = today();
    state.session.lock().await.cursor.next(today);
    Ok(Json(build_calendar(&state, today).await?))
}

pub async fn current_month(State(state): State<AppState>) -> Result<Json<CalendarResponse>, AppError> {
    let today = today();
    state.session.lock().await.cursor.reset(today);
    Ok(Json(build_calendar(&state, today).await?))
}

pub async fn check_in(
    State(state): State<AppState>,
    payload: Option<Json<CheckInRequest>>,
) -> Result<Json<CheckInResponse>, AppError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let (wallet, habits) = load_habits(&state).await?;
    let account = wallet.ok_or_else(AppError::wallet_required)?;

    let habit_id = match request.habit_id {
        Some(id) => id,
        None => state
            .session
            .lock()
            .await
            .active_habit(&habits)
            .map(|habit| habit.id)
            .ok_or_else(|| AppError::not_found("no habit selected"))?,
    };
    if !habits.iter().any(|habit| habit.id == habit_id) {
        return Err(AppError::not_found(format!("habit {habit_id} not found")));
    }

    let day = day_index(today());
    let fee = state.config.check_in_fee_wei;
    let caller = account.clone();
    let receipt = state
        .submit_write(TxKind::CheckIn, move |contract| async move {
            contract.check_in(&caller, habit_id, day, fee).await
        })
        .await?;

    info!(account = %account, habit_id, day_index = day, "checked in");
    Ok(Json(CheckInResponse {
        habit_id,
        day_index: day,
        tx_hash: receipt.tx_hash,
    }))
}

pub async fn get_transaction(State(state): State<AppState>) -> Json<TransactionView> {
    Json(state.transactions.lock().await.snapshot(Instant::now()))
}

pub async fn dismiss_transaction(State(state): State<AppState>) -> Json<TransactionView> {
    let mut transactions = state.transactions.lock().await;
    transactions.dismiss();
    Json(transactions.snapshot(Instant::now()))
}

/// Month grid, per-day check-in status and statistics for the active habit.
pub async fn build_calendar(state: &AppState, today: NaiveDate) -> Result<CalendarResponse, AppError> {
    let (wallet, habits) = load_habits(state).await?;
    let (cursor, habit) = {
        let mut session = state.session.lock().await;
        (session.cursor, session.active_habit(&habits).cloned())
    };

    let layout = build_month(cursor, today);
    let evaluated = evaluated_days(cursor, today) as usize;
    let statuses = match (&wallet, &habit) {
        (Some(account), Some(habit)) => {
            let indices: Vec<DayIndex> = layout
                .days
                .iter()
                .take(evaluated)
                .map(|day| day.day_index)
                .collect();
            fetch_day_statuses(
                state.contract.as_ref(),
                account,
                habit.id,
                &indices,
                state.config.read_timeout,
            )
            .await
        }
        _ => vec![DayStatus::Unchecked; evaluated],
    };

    let checked: Vec<bool> = statuses.iter().map(|status| status.is_checked()).collect();
    let stats = build_month_stats(&checked, layout.is_current_month);

    let can_write = wallet.is_some() && habit.is_some() && !state.transactions.lock().await.is_pending();
    let days = layout
        .days
        .iter()
        .enumerate()
        .map(|(position, day)| {
            let status = statuses.get(position).copied().unwrap_or(DayStatus::Upcoming);
            DayView {
                day: day.day,
                date: day.date.clone(),
                day_index: day.day_index,
                is_today: day.is_today,
                is_past: day.is_past,
                status,
                can_check_in: can_write
                    && day.is_today
                    && matches!(status, DayStatus::Unchecked | DayStatus::Unknown),
            }
        })
        .collect();

    Ok(CalendarResponse {
        month: layout,
        habit: habit.as_ref().map(HabitView::from),
        days,
        stats,
    })
}

async fn session_response(state: &AppState) -> SessionResponse {
    let transaction = state.transactions.lock().await.snapshot(Instant::now());
    let session = state.session.lock().await;
    SessionResponse {
        wallet: session.wallet_view(),
        year: session.cursor.year(),
        month: session.cursor.month(),
        selected_habit: session.selected_habit(),
        transaction,
        contract: ContractInfo {
            address: state.config.contract_address.to_string(),
            check_in_fee_wei: state.config.check_in_fee_wei.to_string(),
            check_in_fee: format!("{} ETH", format_ether(state.config.check_in_fee_wei)),
            registry: state.registry.backend().to_string(),
        },
    }
}

async fn habits_response(state: &AppState) -> Result<HabitsResponse, AppError> {
    let (_, habits) = load_habits(state).await?;
    let mut session = state.session.lock().await;
    session.active_habit(&habits);
    Ok(HabitsResponse {
        habits: habits.iter().map(HabitView::from).collect(),
        selected_habit: session.selected_habit(),
    })
}

async fn load_habits(state: &AppState) -> Result<(Option<Address>, Vec<Habit>), AppError> {
    let wallet = state.session.lock().await.wallet().cloned();
    let habits = state.registry.load(wallet.as_ref()).await?;
    Ok((wallet, habits))
}

async fn connected_account(state: &AppState) -> Result<Address, AppError> {
    state
        .session
        .lock()
        .await
        .wallet()
        .cloned()
        .ok_or_else(AppError::wallet_required)
}

fn validate_form(form: &HabitForm) -> Result<(String, HabitColor), AppError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("habit name must not be empty"));
    }
    let color = HabitColor::from_index(form.color_index).ok_or_else(|| {
        AppError::bad_request(format!("color index {} is out of range", form.color_index))
    })?;
    Ok((name.to_string(), color))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
