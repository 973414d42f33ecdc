//! A small service on top of Trellis.
//!
//! ```text
//! TRELLIS__SERVER__ADDRESS=127.0.0.1:3000 cargo run -p trellis --example hello
//! curl localhost:3000/hello/world
//! curl -H 'x-token: secret' localhost:3000/admin/files/logs/today.txt
//! ```

use std::sync::Arc;

use trellis::prelude::*;

fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_development()
        .with_optional_file("trellis.toml")?
        .with_env_prefix("TRELLIS")
        .load()?;

    let mut engine = config.build_engine()?;
    engine.use_middleware([recovery(), logger()]);

    engine.get(
        "/hello/:name",
        [handler(|ctx| {
            let greeting = format!("hello, {}", ctx.param("name").unwrap_or("stranger"));
            ctx.string(StatusCode::OK, greeting);
            Ok(())
        })],
    );

    let token_check = handler(|ctx| {
        let authorized = ctx.request_header("x-token") == Some("secret");
        if !authorized {
            return Err(HttpError::unauthorized().into());
        }
        ctx.set("user", "admin".to_string());
        Ok(())
    });

    let mut admin = engine.group("/admin", [token_check]);
    admin.get(
        "/files/*path",
        [handler(|ctx| {
            let user: String = ctx.must_get("user");
            let body = format!("{user} reads {}", ctx.param("path").unwrap_or_default());
            ctx.string(StatusCode::OK, body);
            Ok(())
        })],
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(Server::new(Arc::new(engine)).start())?;
    Ok(())
}
