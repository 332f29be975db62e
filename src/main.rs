use api::{
    db::{Config, Database, NoTls},
    http, PollService,
};
use hyper::{server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use std::{
    convert::Infallible,
    env,
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tokio::{net::TcpListener, runtime::Runtime};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Parse environment variables
    let port = env::var("PORT")?.parse()?;
    let user = env::var("PG_USERNAME")?;
    let pass = env::var("PG_PASSWORD")?;
    let host = env::var("PG_HOSTNAME")?;
    let data = env::var("PG_DATABASE")?;
    let pg_port = match env::var("PG_PORT") {
        Ok(pg_port) => pg_port.parse()?,
        _ => 5432,
    };

    let mut config = Config::new();
    config.user(&user).password(&pass).host(&host).dbname(&data).port(pg_port);

    let runtime = Runtime::new()?;
    runtime.block_on(async move {
        // Connect to the database
        let (client, conn) = config.connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(err) = conn.await {
                log::error!("database connection closed: {err}");
            }
        });

        let db = Database::from(client);
        db.migrate().await.map_err(|err| anyhow::anyhow!("cannot apply schema: {err}"))?;
        let service = Arc::new(PollService::new(db));

        // Run the server
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let listener = TcpListener::bind(addr).await?;
        log::info!("listening on {addr}");

        let mut stop = core::pin::pin!(tokio::signal::ctrl_c());
        loop {
            let (stream, peer) = tokio::select! {
                biased;
                res = &mut stop => {
                    res?;
                    break;
                }
                res = listener.accept() => res?,
            };

            log::debug!("accepted connection from {peer}");
            let service = service.clone();
            tokio::spawn(async move {
                let handler = service_fn(move |req| {
                    let service = service.clone();
                    async move { Ok::<_, Infallible>(http::respond(&*service, req).await) }
                });
                if let Err(err) = http1::Builder::new().serve_connection(TokioIo::new(stream), handler).await {
                    log::error!("failed to serve connection from {peer}: {err}");
                }
            });
        }

        log::info!("shutting down");
        anyhow::Ok(())
    })
}
