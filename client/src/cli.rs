use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client::{
    can_download, can_retry, connect, poll_job_status, save_report, BatchStore, Config,
    JobListView, Outcome, RefreshTrigger, UploadFile, UploadOptions, UploadWorkflow,
};
use common::{
    format_date_time, format_file_size, format_number, format_percent, format_status,
    get_status_color, BatchJob, JobStatusReport, ACCEPTED_EXTENSIONS,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "batchctl")]
#[command(about = "CLI para cargar lotes de pagos y seguir sus jobs")]
struct Cli {
    /// URL base de la API (pisa BATCH_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Si la API falla, responder con datos de demo
    #[arg(long, global = true)]
    demo: bool,

    /// Salida en JSON en vez de texto
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sube un archivo CSV o Excel como nuevo batch
    Upload {
        #[arg(value_name = "ARCHIVO")]
        file: PathBuf,

        /// Campo extra del formulario, se puede repetir: --option clave=valor
        #[arg(long = "option", value_name = "CLAVE=VALOR", value_parser = parse_key_val)]
        options: Vec<(String, String)>,

        /// Después de subir, seguir el estado hasta que termine
        #[arg(long)]
        follow: bool,
    },
    /// Lista los jobs paginados
    Jobs {
        /// Número de página, desde 1
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Filas por página (5, 10, 25 o 50)
        #[arg(long)]
        size: Option<u32>,

        /// Recargar periódicamente hasta Ctrl-C
        #[arg(long)]
        watch: bool,

        /// Segundos entre recargas con --watch
        #[arg(long, default_value_t = 10)]
        interval: u64,
    },
    /// Muestra el detalle de un job
    Job {
        #[arg(value_name = "JOB_ID")]
        job_id: String,
    },
    /// Consulta el estado de un job
    Status {
        #[arg(value_name = "JOB_ID")]
        job_id: String,

        /// Seguir consultando hasta que termine
        #[arg(long)]
        follow: bool,

        /// Segundos entre consultas
        #[arg(long, default_value_t = 2)]
        interval: u64,

        #[arg(long, default_value_t = 60)]
        max_polls: u32,
    },
    /// Reintenta los registros fallidos de un job completado
    Retry {
        #[arg(value_name = "JOB_ID")]
        job_id: String,
    },
    /// Descarga el reporte CSV de un job completado
    Report {
        #[arg(value_name = "JOB_ID")]
        job_id: String,

        /// Directorio destino (pisa BATCH_DOWNLOAD_DIR)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Cancela un job
    Cancel {
        #[arg(value_name = "JOB_ID")]
        job_id: String,
    },
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("se esperaba CLAVE=VALOR, vino {raw:?}")),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status_label(status: &str) -> String {
    format!("{} [{}]", format_status(status), get_status_color(status))
}

fn print_job(job: &BatchJob) {
    println!("Job {}", job.job_id);
    println!("  archivo    : {}", job.file_name);
    println!("  estado     : {}", status_label(job.status.as_str()));
    println!(
        "  registros  : total={}, exitosos={}, fallidos={}",
        format_number(job.total_records),
        format_number(job.success_count),
        format_number(job.failed_count)
    );
    println!("  progreso   : {}", format_percent(job.progress_percent()));
    println!(
        "  subido     : {} por {}",
        format_date_time(Some(job.uploaded_date)),
        if job.uploaded_by.is_empty() { "-" } else { job.uploaded_by.as_str() }
    );
    println!("  finalizado : {}", format_date_time(job.completed_date));
}

fn print_status(report: &JobStatusReport) {
    println!(
        "{}: {} ({})",
        report.job_id,
        status_label(report.status.as_str()),
        format_percent(report.progress)
    );
}

async fn follow_status(
    store: &BatchStore,
    job_id: &str,
    interval: u64,
    max_polls: u32,
    json: bool,
) -> Result<()> {
    let last = poll_job_status(
        store,
        job_id,
        Duration::from_secs(interval.max(1)),
        max_polls,
        |r| {
            if !json {
                print_status(r);
            }
        },
    )
    .await
    .with_context(|| format!("consultando estado de {job_id}"))?;

    if json {
        print_json(&last)?;
    } else if !last.status.is_terminal() {
        println!("(se alcanzó el máximo de {max_polls} consultas; el job sigue en curso)");
    }
    Ok(())
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if cli.demo {
        config.mock_fallback_enabled = true;
    }

    let api = connect(&config)?;
    let store = Arc::new(BatchStore::new(api));
    let json = cli.json;

    match cli.command {
        Commands::Upload {
            file,
            options,
            follow,
        } => {
            let upload = UploadFile::from_path(&file)
                .await
                .with_context(|| format!("no se pudo abrir {}", file.display()))?;

            let mut workflow = UploadWorkflow::new(RefreshTrigger::new());
            if let Err(err) = workflow.select_file(upload) {
                let exts: Vec<String> = ACCEPTED_EXTENSIONS.iter().map(|e| format!(".{e}")).collect();
                eprintln!("Extensiones aceptadas: {}", exts.join(", "));
                bail!(err);
            }
            if let Some(selected) = workflow.selected() {
                info!(
                    "archivo listo: {} ({}, {})",
                    selected.name,
                    format_file_size(selected.size),
                    selected.mime_type
                );
            }

            let options: UploadOptions = options.into_iter().collect();
            let status = workflow.submit(&store, &options).await?;
            if !status.success {
                bail!("la carga falló: {}", status.message);
            }

            if json {
                print_json(&serde_json::json!({
                    "success": status.success,
                    "message": status.message,
                    "jobId": status.job_id,
                }))?;
            } else {
                println!("{}", status.message);
                if let Some(id) = &status.job_id {
                    println!("  job id: {id}");
                }
            }

            if follow {
                if let Some(id) = status.job_id {
                    follow_status(&store, &id, 2, 60, json).await?;
                }
            }
        }

        Commands::Jobs {
            page,
            size,
            watch,
            interval,
        } => {
            let trigger = RefreshTrigger::new();
            let mut view = JobListView::new(
                store.clone(),
                trigger.subscribe(),
                size.unwrap_or(config.page_size),
                config.download_dir.clone(),
            );

            view.set_page(page - 1).await?;
            if json {
                print_json(&serde_json::json!({
                    "content": view.jobs(),
                    "totalElements": view.total_count(),
                    "number": view.page(),
                    "size": view.rows_per_page(),
                }))?;
            } else {
                print!("{}", view.render());
            }

            if watch {
                let ticker_trigger = trigger.clone();
                let every = Duration::from_secs(interval.max(1));
                let ticker = tokio::spawn(async move {
                    let mut tick = tokio::time::interval(every);
                    tick.tick().await;
                    loop {
                        tick.tick().await;
                        ticker_trigger.bump();
                    }
                });

                loop {
                    tokio::select! {
                        res = view.watch_refresh() => {
                            match res {
                                Some(Ok(())) => {
                                    println!();
                                    print!("{}", view.render());
                                }
                                Some(Err(err)) => eprintln!("Error recargando: {err}"),
                                None => break,
                            }
                        }
                        _ = tokio::signal::ctrl_c() => {
                            println!("Fin del seguimiento.");
                            break;
                        }
                    }
                }
                ticker.abort();
            }
        }

        Commands::Job { job_id } => {
            let job = store
                .get_batch_job(&job_id)
                .await
                .with_context(|| format!("consultando {job_id}"))?;
            if json {
                print_json(&job)?;
            } else {
                print_job(&job);
            }
        }

        Commands::Status {
            job_id,
            follow,
            interval,
            max_polls,
        } => {
            if follow {
                follow_status(&store, &job_id, interval, max_polls, json).await?;
            } else {
                let report = store
                    .get_batch_job_status(&job_id)
                    .await
                    .with_context(|| format!("consultando estado de {job_id}"))?;
                if json {
                    print_json(&report)?;
                } else {
                    print_status(&report);
                }
            }
        }

        Commands::Retry { job_id } => {
            let job = store.get_batch_job(&job_id).await?;
            if !can_retry(&job) {
                bail!(
                    "{} no admite reintento (estado {}, fallidos {})",
                    job_id,
                    job.status,
                    job.failed_count
                );
            }
            match store.retry_failed_records(&job_id).await {
                Outcome::Success(ack) if json => print_json(&ack)?,
                Outcome::Success(ack) => println!("{}", ack.message),
                Outcome::Failure(message) => bail!(message),
            }
        }

        Commands::Report { job_id, out } => {
            let job = store.get_batch_job(&job_id).await?;
            if !can_download(&job) {
                bail!("el reporte de {} todavía no está disponible (estado {})", job_id, job.status);
            }
            let dir = out.unwrap_or(config.download_dir);
            match store.download_report(&job_id).await {
                Outcome::Success(report) => {
                    let path = save_report(&dir, &report, &job_id).await?;
                    if json {
                        print_json(&serde_json::json!({
                            "jobId": job_id,
                            "path": path,
                            "bytes": report.bytes.len(),
                        }))?;
                    } else {
                        println!(
                            "Reporte guardado en {} ({})",
                            path.display(),
                            format_file_size(report.bytes.len() as u64)
                        );
                    }
                }
                Outcome::Failure(message) => bail!(message),
            }
        }

        Commands::Cancel { job_id } => match store.cancel_batch_job(&job_id).await {
            Outcome::Success(ack) if json => print_json(&ack)?,
            Outcome::Success(ack) => println!("{}", ack.message),
            Outcome::Failure(message) => bail!(message),
        },
    }

    Ok(())
}
