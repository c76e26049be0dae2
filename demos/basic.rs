//! Minimal mvcapp example: a session-backed visit counter, a login form,
//! JSON output, and static files from `./public`.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -c jar -b jar http://localhost:3000/
//!   curl -c jar -b jar http://localhost:3000/Home/Show/42
//!   curl -c jar -b jar -X POST http://localhost:3000/Account/Login \
//!        -H 'content-type: application/x-www-form-urlencoded' \
//!        -d 'user=alice'
//!   curl -c jar -b jar http://localhost:3000/Account/Whoami
//!   curl http://localhost:3000/Home/Nope

use mvcapp::{Config, Controller, Request, Router, Server};
use serde_json::json;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config { root: "public".into(), ..Config::default() };

    let app = Router::new()
        .config(config)
        .with_sessions()
        .controller("Home", home)
        .controller("Account", account);

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// /Home/Index  → visit counter kept in the session
// /Home/Show/7 → JSON echo of the parameter and query
fn home(req: Request) -> Controller {
    let mut c = Controller::new(req);

    c.get("Index", |c, _| {
        let visits = {
            let mut session = c.session()?.lock();
            let visits = session.get_as::<u64>("visits").unwrap_or(0) + 1;
            session.set("visits", visits);
            visits
        };
        Some(c.text(format!("visit #{visits}")))
    });

    c.get("Show", |c, params| {
        let id = params.first()?;
        Some(c.json(&json!({ "id": id, "query": c.query() })))
    });

    c.on_not_found(|c| c.html(format!("<h1>No page at {}</h1>", c.requested_path())));
    c
}

// /Account/Login  (POST form: user=…) → stores the user, redirects home
// /Account/Whoami → the stored user
// /Account/Logout → clears it
fn account(req: Request) -> Controller {
    let mut c = Controller::new(req);

    c.post("Login", |c, _| {
        let user = c.request().form_value("user")?.to_owned();
        c.set_session_value("user", user);
        Some(c.redirect("/"))
    });

    c.get("Whoami", |c, _| {
        let user = c.session_value::<String>("user").unwrap_or_else(|| "anonymous".to_owned());
        Some(c.text(user))
    });

    c.get("Logout", |c, _| {
        if let Some(session) = c.session() {
            session.lock().remove("user");
        }
        Some(c.redirect_js("/"))
    });

    c.on_before_execute(|c| {
        tracing::debug!(action = ?c.action_and_params().0, "account request");
    });
    c
}
