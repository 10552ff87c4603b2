use crate::config::Config;
use crate::contract::format_ether;
use crate::palette::HabitColor;

pub fn render_index(config: &Config) -> String {
    let swatches: String = HabitColor::ALL
        .iter()
        .map(|color| {
            let style = color.style();
            format!(
                r#"<button class="swatch" type="button" data-color="{index}" style="background:{bg}"><span style="background:{accent}"></span>{name}</button>"#,
                index = color.index(),
                bg = style.background,
                accent = style.accent,
                name = style.name,
            )
        })
        .collect();

    INDEX_HTML
        .replace("{{CONTRACT}}", config.contract_address.as_str())
        .replace("{{FEE}}", &format_ether(config.check_in_fee_wei))
        .replace("{{SWATCHES}}", &swatches)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Habit Tracker</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg: #dbeafe;
      --border: #60a5fa;
      --accent: #0052FF;
      --ink: #1f2937;
      --muted: #6b7280;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(31, 41, 55, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: start center;
      padding: 32px 18px 48px;
      transition: background 300ms ease;
    }

    .app {
      width: min(760px, 100%);
      display: grid;
      gap: 20px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 16px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(1.8rem, 4vw, 2.5rem);
      margin: 0;
    }

    .subtitle {
      margin: 4px 0 0;
      color: var(--muted);
    }

    button {
      appearance: none;
      border: none;
      border-radius: 12px;
      padding: 10px 16px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
      transition: transform 150ms ease, box-shadow 150ms ease;
    }

    button:active {
      transform: scale(0.98);
    }

    button:disabled {
      cursor: not-allowed;
      opacity: 0.5;
    }

    .primary {
      background: var(--accent);
      color: white;
    }

    .ghost {
      background: #f3f4f6;
      color: var(--muted);
    }

    .wallet {
      display: flex;
      align-items: center;
      gap: 10px;
      background: white;
      border: 2px solid var(--accent);
      border-radius: 12px;
      padding: 8px 12px;
    }

    .wallet .dot {
      width: 8px;
      height: 8px;
      border-radius: 50%;
      background: #22c55e;
    }

    .tabs {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
    }

    .tab {
      background: white;
      border: 2px solid #d1d5db;
      color: #374151;
    }

    .tab.add {
      border-style: dashed;
    }

    .card {
      background: var(--card);
      border: 2px solid var(--border);
      border-radius: 24px;
      box-shadow: var(--shadow);
      padding: 24px;
      display: grid;
      gap: 18px;
    }

    .card-header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    .card-header h2 {
      margin: 0;
    }

    .nav {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 8px;
    }

    .month-title {
      font-weight: 600;
      font-size: 1.1rem;
    }

    .stats {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(120px, 1fr));
      gap: 12px;
    }

    .stat {
      background: white;
      border-radius: 16px;
      padding: 14px;
      border: 1px solid rgba(31, 41, 55, 0.08);
      display: grid;
      gap: 6px;
      justify-items: center;
    }

    .ring {
      width: 64px;
      height: 64px;
    }

    .ring circle {
      fill: none;
      stroke-width: 6;
    }

    .ring .track {
      stroke: #e5e7eb;
    }

    .ring .value {
      stroke: var(--accent);
      stroke-linecap: round;
      transform: rotate(-90deg);
      transform-origin: 50% 50%;
      transition: stroke-dashoffset 400ms ease;
    }

    .stat .label {
      font-size: 0.75rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .stat .number {
      font-size: 1.4rem;
      font-weight: 600;
    }

    .badges {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
    }

    .badge {
      border-radius: 999px;
      padding: 6px 12px;
      font-size: 0.85rem;
      background: #f3f4f6;
      color: #9ca3af;
    }

    .badge.earned {
      background: var(--accent);
      color: white;
    }

    .calendar {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 6px;
    }

    .day-header {
      text-align: center;
      font-size: 0.8rem;
      color: var(--muted);
      font-weight: 600;
    }

    .day-cell {
      min-height: 64px;
      border: 2px solid #e5e7eb;
      border-radius: 12px;
      background: white;
      padding: 6px;
      display: grid;
      align-content: space-between;
      justify-items: center;
    }

    .day-cell.today {
      border-color: #3b82f6;
    }

    .day-cell.missed {
      opacity: 0.55;
    }

    .day-cell.checked {
      background: var(--accent);
      color: white;
    }

    .day-cell.unknown {
      border-style: dashed;
    }

    .day-cell button {
      padding: 4px 8px;
      font-size: 0.75rem;
      background: var(--accent);
      color: white;
    }

    .status {
      min-height: 1.4em;
      border-radius: 12px;
      padding: 10px 14px;
      display: none;
      justify-content: space-between;
      align-items: center;
    }

    .status[data-type="pending"],
    .status[data-type="success"],
    .status[data-type="error"] {
      display: flex;
    }

    .status[data-type="pending"] {
      background: #eff6ff;
      color: #1d4ed8;
    }

    .status[data-type="success"] {
      background: #ecfdf5;
      color: #2d7a4b;
    }

    .status[data-type="error"] {
      background: #fef2f2;
      color: #c63b2b;
    }

    .info {
      font-size: 0.9rem;
      color: var(--muted);
      display: grid;
      gap: 4px;
    }

    .info p {
      margin: 0;
      word-break: break-all;
    }

    dialog {
      border: none;
      border-radius: 24px;
      padding: 32px;
      width: min(440px, 90vw);
      box-shadow: 0 20px 60px rgba(0, 0, 0, 0.3);
    }

    dialog::backdrop {
      background: rgba(0, 0, 0, 0.7);
      backdrop-filter: blur(6px);
    }

    dialog form {
      display: grid;
      gap: 16px;
    }

    dialog input {
      width: 100%;
      padding: 12px;
      border: 2px solid #e5e7eb;
      border-radius: 12px;
      font: inherit;
    }

    .swatches {
      display: grid;
      grid-template-columns: repeat(4, 1fr);
      gap: 10px;
    }

    .swatch {
      display: grid;
      justify-items: center;
      gap: 6px;
      border: 2px solid #e5e7eb;
      color: var(--muted);
      font-size: 0.75rem;
    }

    .swatch span {
      width: 28px;
      height: 28px;
      border-radius: 8px;
    }

    .swatch.selected {
      border-width: 3px;
      border-color: var(--ink);
    }

    .dialog-actions {
      display: flex;
      gap: 10px;
    }

    .dialog-actions button {
      flex: 1;
    }

    .danger {
      background: #fee2e2;
      color: #b91c1c;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <div>
        <h1>Habit Tracker</h1>
        <p class="subtitle">Track your daily habits on-chain</p>
      </div>
      <div id="wallet-area"></div>
    </header>

    <div class="status" id="status">
      <span id="status-text"></span>
      <button class="ghost" id="status-dismiss" type="button">&times;</button>
    </div>

    <nav class="tabs" id="tabs"></nav>

    <section class="card" id="habit-card">
      <div class="card-header">
        <h2 id="habit-name">Connect wallet to start</h2>
        <button class="ghost" id="edit-habit" type="button" hidden>Edit</button>
      </div>

      <div class="nav">
        <button class="ghost" id="prev-month" type="button">&larr;</button>
        <div class="month-title" id="month-title"></div>
        <div>
          <button class="ghost" id="this-month" type="button">Today</button>
          <button class="ghost" id="next-month" type="button">&rarr;</button>
        </div>
      </div>

      <div class="stats">
        <div class="stat">
          <svg class="ring" viewBox="0 0 64 64"><circle class="track" cx="32" cy="32" r="26" /><circle class="value" id="ring" cx="32" cy="32" r="26" /></svg>
          <span class="label">Completion</span>
        </div>
        <div class="stat">
          <span class="number" id="streak">0</span>
          <span class="label">Current streak</span>
        </div>
        <div class="stat">
          <span class="number" id="total">0</span>
          <span class="label">Check-ins</span>
        </div>
      </div>

      <div class="badges">
        <span class="badge" id="badge-week_streak">7-day streak</span>
        <span class="badge" id="badge-month_streak">30-day streak</span>
        <span class="badge" id="badge-perfect_month">Perfect month</span>
        <span class="badge" id="badge-century">100 check-ins</span>
      </div>

      <div class="calendar" id="calendar"></div>
    </section>

    <section class="info">
      <p><strong id="ready">Connect wallet to start</strong></p>
      <p>Each check-in costs {{FEE}} ETH</p>
      <p>Contract: {{CONTRACT}}</p>
    </section>
  </main>

  <dialog id="wallet-dialog">
    <form method="dialog" id="wallet-form">
      <h3>Connect a Wallet</h3>
      <input id="wallet-address" placeholder="0x..." autocomplete="off" />
      <div class="dialog-actions">
        <button class="ghost" value="cancel" type="button" id="wallet-cancel">Cancel</button>
        <button class="primary" type="submit">Connect</button>
      </div>
    </form>
  </dialog>

  <dialog id="habit-dialog">
    <form method="dialog" id="habit-form">
      <h3 id="habit-dialog-title">Add New Habit</h3>
      <input id="habit-input" placeholder="e.g., Morning Exercise, Read 30 min" autocomplete="off" />
      <div class="swatches" id="swatches">{{SWATCHES}}</div>
      <div class="dialog-actions">
        <button class="danger" type="button" id="habit-delete" hidden>Delete</button>
        <button class="ghost" type="button" id="habit-cancel">Cancel</button>
        <button class="primary" type="submit" id="habit-save">Add Habit</button>
      </div>
    </form>
  </dialog>

  <script>
    const $ = (id) => document.getElementById(id);
    const RING = 2 * Math.PI * 26;
    let session = null;
    let habits = [];
    let selected = null;
    let editing = null;
    let chosenColor = 0;
    let statusTimer = null;

    const api = async (method, path, body) => {
      const res = await fetch(path, {
        method,
        headers: body ? { 'content-type': 'application/json' } : {},
        body: body ? JSON.stringify(body) : undefined
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      return res.json();
    };

    const showTransaction = (tx) => {
      const el = $('status');
      el.dataset.type = tx.status;
      $('status-text').textContent = tx.message || '';
      clearTimeout(statusTimer);
      if (tx.status === 'success' || tx.status === 'error') {
        statusTimer = setTimeout(() => api('GET', '/api/transaction').then(showTransaction), tx.status === 'error' ? 5000 : 3000);
      }
    };

    const pollTransaction = () => api('GET', '/api/transaction').then(showTransaction).catch(() => {});

    const applyColor = (habit) => {
      const color = habit ? habit.color : { background: '#dbeafe', border: '#60a5fa', accent: '#0052FF' };
      document.documentElement.style.setProperty('--bg', color.background);
      document.documentElement.style.setProperty('--border', color.border);
      document.documentElement.style.setProperty('--accent', color.accent);
    };

    const renderWallet = () => {
      const area = $('wallet-area');
      if (session.wallet.connected) {
        area.innerHTML = `<div class="wallet"><span class="dot"></span><strong>${session.wallet.short_address}</strong><button class="ghost" id="disconnect" type="button">Disconnect</button></div>`;
        $('disconnect').onclick = () => api('POST', '/api/wallet/disconnect').then(refresh);
      } else {
        area.innerHTML = '<button class="primary" id="connect" type="button">Connect Wallet</button>';
        $('connect').onclick = () => $('wallet-dialog').showModal();
      }
      $('ready').textContent = session.wallet.connected ? 'Ready to check-in!' : 'Connect wallet to start';
    };

    const renderTabs = () => {
      const tabs = $('tabs');
      tabs.innerHTML = '';
      habits.forEach((habit) => {
        const button = document.createElement('button');
        button.type = 'button';
        button.className = 'tab';
        button.textContent = habit.name;
        if (habit.id === selected) {
          button.style.background = habit.color.accent;
          button.style.borderColor = habit.color.accent;
          button.style.color = 'white';
        }
        button.onclick = () => api('POST', `/api/habits/${habit.id}/select`).then(loadHabitsFrom).then(loadCalendar);
        tabs.appendChild(button);
      });
      const add = document.createElement('button');
      add.type = 'button';
      add.className = 'tab add';
      add.textContent = '+ Add Habit';
      add.onclick = () => openHabitDialog(null);
      tabs.appendChild(add);
    };

    const loadHabitsFrom = (data) => {
      habits = data.habits;
      selected = data.selected_habit;
      renderTabs();
    };

    const renderCalendar = (data) => {
      applyColor(data.habit);
      $('habit-name').textContent = data.habit ? data.habit.name : (session.wallet.connected ? 'Add a habit to start' : 'Connect wallet to start');
      $('edit-habit').hidden = !data.habit || !session.wallet.connected;
      $('month-title').textContent = data.month.label;
      $('next-month').disabled = !data.month.can_go_next;

      $('ring').style.strokeDasharray = RING;
      $('ring').style.strokeDashoffset = RING * (1 - data.stats.completion_percentage / 100);
      $('streak').textContent = data.stats.current_streak;
      $('total').textContent = data.stats.total_checked;
      Object.entries(data.stats.achievements).forEach(([name, earned]) => {
        const badge = $(`badge-${name}`);
        if (badge) badge.classList.toggle('earned', earned);
      });

      const calendar = $('calendar');
      calendar.innerHTML = ['Sun', 'Mon', 'Tue', 'Wed', 'Thu', 'Fri', 'Sat']
        .map((day) => `<div class="day-header">${day}</div>`)
        .join('');
      for (let i = 0; i < data.month.first_weekday_offset; i += 1) {
        calendar.appendChild(document.createElement('div'));
      }
      data.days.forEach((day) => {
        const cell = document.createElement('div');
        cell.className = 'day-cell';
        if (day.is_today) cell.classList.add('today');
        if (day.status === 'checked') cell.classList.add('checked');
        if (day.status === 'unknown') cell.classList.add('unknown');
        if (day.is_past && day.status !== 'checked') cell.classList.add('missed');
        cell.innerHTML = `<div>${day.day}</div>`;
        if (day.status === 'checked') {
          cell.innerHTML += '<div>&#10003;</div>';
        }
        if (day.can_check_in) {
          const button = document.createElement('button');
          button.type = 'button';
          button.textContent = 'Check-in';
          button.onclick = () => submit(() => api('POST', '/api/check-in', { habit_id: data.habit.id }));
          cell.appendChild(button);
        }
        calendar.appendChild(cell);
      });
    };

    const loadCalendar = () => api('GET', '/api/calendar').then(renderCalendar);

    const refresh = async () => {
      session = await api('GET', '/api/session');
      renderWallet();
      showTransaction(session.transaction);
      loadHabitsFrom(await api('GET', '/api/habits'));
      await loadCalendar();
    };

    const submit = async (write) => {
      showTransaction({ status: 'pending', message: 'Waiting for confirmation...' });
      const poll = setInterval(pollTransaction, 1000);
      try {
        await write();
      } catch (err) {
        // the transaction status carries the user-facing message
      } finally {
        clearInterval(poll);
        await pollTransaction();
        await refresh().catch(() => {});
      }
    };

    const openHabitDialog = (habit) => {
      editing = habit;
      chosenColor = habit ? habit.color_index : 0;
      $('habit-input').value = habit ? habit.name : '';
      $('habit-dialog-title').textContent = habit ? 'Edit Habit' : 'Add New Habit';
      $('habit-save').textContent = habit ? 'Save' : 'Add Habit';
      $('habit-delete').hidden = !habit;
      markSwatch();
      $('habit-dialog').showModal();
    };

    const markSwatch = () => {
      document.querySelectorAll('.swatch').forEach((swatch) => {
        swatch.classList.toggle('selected', Number(swatch.dataset.color) === chosenColor);
      });
    };

    document.querySelectorAll('.swatch').forEach((swatch) => {
      swatch.onclick = () => {
        chosenColor = Number(swatch.dataset.color);
        markSwatch();
      };
    });

    $('habit-form').addEventListener('submit', (event) => {
      event.preventDefault();
      const name = $('habit-input').value.trim();
      if (!name) return;
      const body = { name, color_index: chosenColor };
      const target = editing;
      $('habit-dialog').close();
      submit(() => target ? api('PUT', `/api/habits/${target.id}`, body) : api('POST', '/api/habits', body));
    });

    $('habit-delete').onclick = () => {
      const target = editing;
      $('habit-dialog').close();
      if (target) submit(() => api('DELETE', `/api/habits/${target.id}`));
    };

    $('habit-cancel').onclick = () => $('habit-dialog').close();
    $('edit-habit').onclick = () => openHabitDialog(habits.find((habit) => habit.id === selected) || null);

    $('wallet-form').addEventListener('submit', (event) => {
      event.preventDefault();
      api('POST', '/api/wallet/connect', { address: $('wallet-address').value })
        .then(() => {
          $('wallet-dialog').close();
          return refresh();
        })
        .catch((err) => alert(err.message));
    });
    $('wallet-cancel').onclick = () => $('wallet-dialog').close();

    $('prev-month').onclick = () => api('POST', '/api/calendar/prev').then(renderCalendar);
    $('next-month').onclick = () => api('POST', '/api/calendar/next').then(renderCalendar);
    $('this-month').onclick = () => api('POST', '/api/calendar/today').then(renderCalendar);
    $('status-dismiss').onclick = () => api('POST', '/api/transaction/dismiss').then(showTransaction);

    refresh().catch((err) => showTransaction({ status: 'error', message: err.message }));
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_shows_contract_fee_and_palette() {
        let config = Config::from_lookup(|_| None).unwrap();
        let page = render_index(&config);
        assert!(page.contains("Each check-in costs 0.00001 ETH"));
        assert!(page.contains(config.contract_address.as_str()));
        assert_eq!(page.matches(r#"class="swatch""#).count(), 8);
        assert!(!page.contains("{{"));
    }
}
