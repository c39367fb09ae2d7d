use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{Semaphore, broadcast};
use tracing::{error, info};

use emberkv_common::{DEFAULT_HOST, DEFAULT_PORT, MAX_CONNECTIONS};
use emberkv_server::{Connection, handle_connection};
use emberkv_storage::{Db, Keyspace, Snapshot};

#[derive(Parser, Debug)]
#[command(name = "emberkv-server", about = "EmberKV — key-value store com leitura de snapshot")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long, default_value_t = MAX_CONNECTIONS)]
    max_connections: usize,
    /// Diretório do snapshot (ex.: /tmp/redis-files)
    #[arg(long)]
    dir: Option<String>,
    /// Nome do arquivo de snapshot (ex.: dump.rdb)
    #[arg(long)]
    dbfilename: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emberkv_server=info,emberkv_storage=info".into()),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let snapshot = Snapshot::new(args.dir, args.dbfilename);
    match snapshot.path() {
        Some(path) => info!("snapshot configurado: {path:?}"),
        None => info!("sem snapshot configurado"),
    }
    let keyspace = Keyspace::new(Db::new(), snapshot);

    let listener = TcpListener::bind(&addr).await?;
    info!("EmberKV escutando em {addr}");

    let semaphore = Arc::new(Semaphore::new(args.max_connections));
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    loop {
        let permit = tokio::select! {
            permit = semaphore.clone().acquire_owned() => permit?,
            _ = signal::ctrl_c() => {
                info!("shutdown signal recebido");
                break;
            }
        };

        let (socket, addr) = tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok(v) => v,
                    Err(e) => {
                        error!("erro ao aceitar conexão: {e}");
                        continue;
                    }
                }
            }
            _ = signal::ctrl_c() => {
                info!("shutdown signal recebido");
                break;
            }
        };

        info!("nova conexão: {addr}");
        let keyspace = keyspace.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();

        tokio::spawn(async move {
            let conn = Connection::new(socket);
            if let Err(e) = handle_connection(conn, keyspace, &mut shutdown_rx).await {
                error!("erro na conexão {addr}: {e}");
            }
            info!("conexão encerrada: {addr}");
            drop(permit);
        });
    }

    // Fecha o canal: conexões abertas recebem o shutdown
    drop(shutdown_tx);

    Ok(())
}
