use crate::models::{ConfigurationData, DayCount, ItemType};

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn render_landing(config: &ConfigurationData, login_url: &str) -> String {
    let body = LANDING_HTML
        .replace("{{LOGIN_URL}}", &html_escape(login_url))
        .replace("{{DESCRIPTION}}", &html_escape(&config.description));
    layout(config, &body)
}

pub fn render_dashboard(
    config: &ConfigurationData,
    counts: &[DayCount],
    is_admin: bool,
    logout_url: &str,
) -> String {
    let rows: String = counts
        .iter()
        .map(|row| {
            // names are stored escaped; escape again so the attribute decodes to the stored form
            format!(
                r#"<li class="row"><span class="name">{name}</span><span class="count">{count}</span><button data-type="{attr}">+1</button></li>"#,
                name = row.name,
                count = row.count,
                attr = html_escape(&row.name),
            )
        })
        .collect();
    let rows = if rows.is_empty() {
        r#"<li class="empty">Nothing to track yet.</li>"#.to_string()
    } else {
        rows
    };

    let body = DASHBOARD_HTML
        .replace("{{ROWS}}", &rows)
        .replace("{{NAV}}", &nav(is_admin, logout_url));
    layout(config, &body)
}

pub fn render_admin(config: &ConfigurationData, items: &[ItemType], logout_url: &str) -> String {
    let rows: String = items
        .iter()
        .map(|item| {
            let (label, next) = if item.active {
                ("active", "false")
            } else {
                ("inactive", "true")
            };
            format!(
                r#"<li class="row"><span class="name">{name}</span><span class="state">{label}</span><form method="post" action="/admin/setitemtypeactive"><input type="hidden" name="id" value="{id}"><input type="hidden" name="active" value="{next}"><button>toggle</button></form></li>"#,
                name = item.name,
                id = item.id,
            )
        })
        .collect();

    let body = ADMIN_HTML
        .replace("{{ITEMS}}", &rows)
        .replace("{{FORM_TITLE}}", &html_escape(&config.title))
        .replace("{{FORM_DESCRIPTION}}", &html_escape(&config.description))
        .replace(
            "{{FORM_GA}}",
            &html_escape(config.analytics_id.as_deref().unwrap_or_default()),
        )
        .replace("{{NAV}}", &nav(true, logout_url));
    layout(config, &body)
}

pub fn render_options(
    config: &ConfigurationData,
    timezone: &str,
    is_admin: bool,
    logout_url: &str,
) -> String {
    let body = OPTIONS_HTML
        .replace("{{TIMEZONE}}", &html_escape(timezone))
        .replace("{{NAV}}", &nav(is_admin, logout_url));
    layout(config, &body)
}

fn nav(is_admin: bool, logout_url: &str) -> String {
    let admin = if is_admin {
        r#"<a href="/admin">admin</a>"#
    } else {
        ""
    };
    format!(
        r#"<nav><a href="/user">today</a><a href="/user/options">options</a>{admin}<a href="{}">sign out</a></nav>"#,
        html_escape(logout_url)
    )
}

fn layout(config: &ConfigurationData, body: &str) -> String {
    let analytics = match config.analytics_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => ANALYTICS_HTML.replace("{{GA_ID}}", &html_escape(id)),
        None => String::new(),
    };
    LAYOUT_HTML
        .replace("{{TITLE}}", &html_escape(&config.title))
        .replace("{{DESCRIPTION}}", &html_escape(&config.description))
        .replace("{{ANALYTICS}}", &analytics)
        .replace("{{BODY}}", body)
}

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <meta name="description" content="{{DESCRIPTION}}" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --muted: #5f5c57;
      --card: #fffaf3;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: #f8f3e6;
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px;
    }

    .app {
      width: min(640px, 100%);
      background: var(--card);
      border-radius: 20px;
      box-shadow: 0 18px 40px rgba(47, 72, 88, 0.16);
      padding: 28px;
      display: grid;
      gap: 20px;
    }

    nav {
      display: flex;
      gap: 14px;
    }

    nav a {
      color: var(--muted);
    }

    ul {
      list-style: none;
      margin: 0;
      padding: 0;
      display: grid;
      gap: 10px;
    }

    .row {
      display: flex;
      align-items: center;
      gap: 12px;
    }

    .row .name {
      flex: 1;
    }

    .count {
      font-size: 1.6rem;
      font-weight: 600;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 8px 16px;
      background: var(--accent);
      color: #fff;
      cursor: pointer;
    }
  </style>
  {{ANALYTICS}}
</head>
<body>
  <main class="app">
    <header>
      <h1>{{TITLE}}</h1>
    </header>
    {{BODY}}
  </main>
</body>
</html>
"#;

const ANALYTICS_HTML: &str = r#"<script async src="https://www.googletagmanager.com/gtag/js?id={{GA_ID}}"></script>
  <script>
    window.dataLayer = window.dataLayer || [];
    function gtag(){dataLayer.push(arguments);}
    gtag('js', new Date());
    gtag('config', '{{GA_ID}}');
  </script>"#;

const LANDING_HTML: &str = r#"<p>{{DESCRIPTION}}</p>
    <p><a href="{{LOGIN_URL}}">Sign in</a></p>"#;

const DASHBOARD_HTML: &str = r#"{{NAV}}
    <ul id="counts">{{ROWS}}</ul>
    <script>
      document.querySelectorAll('#counts button').forEach((button) => {
        button.addEventListener('click', async () => {
          const type = encodeURIComponent(button.dataset.type);
          const res = await fetch(`/user/countitem?type=${type}`);
          if (res.ok) {
            button.parentElement.querySelector('.count').textContent = await res.text();
          }
        });
      });
    </script>"#;

const ADMIN_HTML: &str = r#"{{NAV}}
    <section>
      <h2>Site</h2>
      <form method="post" action="/admin">
        <p><label>Title <input name="title" value="{{FORM_TITLE}}" /></label></p>
        <p><label>Description <textarea name="description">{{FORM_DESCRIPTION}}</textarea></label></p>
        <p><label>Analytics id <input name="ga_account_id" value="{{FORM_GA}}" /></label></p>
        <button>Save</button>
      </form>
    </section>
    <section>
      <h2>Item types</h2>
      <ul id="items">{{ITEMS}}</ul>
      <form id="create-item">
        <input name="name" placeholder="new item type" />
        <button>Add</button>
      </form>
    </section>
    <script>
      document.getElementById('create-item').addEventListener('submit', async (event) => {
        event.preventDefault();
        const body = new URLSearchParams(new FormData(event.target));
        const res = await fetch('/admin/createitemtype', { method: 'POST', body });
        if (res.ok && (await res.text())) {
          window.location.reload();
        }
      });
    </script>"#;

const OPTIONS_HTML: &str = r#"{{NAV}}
    <form method="post" action="/user/options">
      <label>Timezone
        <select id="timezone" name="timezone">
          <option value="{{TIMEZONE}}" selected>{{TIMEZONE}}</option>
        </select>
      </label>
      <button>Save</button>
    </form>
    <script>
      fetch('/user/options/timezones')
        .then((res) => res.json())
        .then((data) => {
          const select = document.getElementById('timezone');
          select.innerHTML = '';
          data.timezones.forEach((tz) => {
            const option = document.createElement('option');
            option.value = tz;
            option.textContent = tz;
            option.selected = tz === data.user_timezone;
            select.appendChild(option);
          });
        });
    </script>"#;
