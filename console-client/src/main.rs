//! `llmctl` - command-line console for a local inference server.

use std::io::Write;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console_common::{ChatMessage, DeployConfig, DeploymentStatus, SystemSnapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use console_client::deploy::{gpu_offload_available, multi_gpu_selectable, recommended_config};
use console_client::registry::DeploymentRegistry;
use console_client::{
    Config, FileStore, GatewayClient, MetricsClient, ModelfileTemplate, Preferences,
    TypingReveal,
};

#[derive(Parser)]
#[command(name = "llmctl", version, about = "manage models on a local inference server")]
struct Cli {
    /// inference server URL for this invocation only (overrides the saved setting)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// list models stored on the server
    Models,

    /// show license, modelfile, parameters and template of a model
    Show { name: String },

    /// download a model
    Pull { name: String },

    /// delete a model
    Rm { name: String },

    /// create a model from a base model and settings
    Create(CreateOpts),

    /// one-shot completion
    Generate { model: String, prompt: String },

    /// interactive chat
    Chat {
        model: String,
        /// system prompt for the conversation
        #[arg(long)]
        system: Option<String>,
    },

    /// host cpu, memory and gpu usage from the metrics server
    System {
        /// keep polling at the configured refresh interval
        #[arg(long)]
        watch: bool,
    },

    /// record a model as deployed, with defaults derived from the host
    Deploy(DeployOpts),

    /// mark a deployment stopped
    Stop { name: String },

    /// re-deploy a stopped model with its recorded settings
    Start { name: String },

    /// list deployments
    Deployments,

    /// show or change saved settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Parser, Debug)]
struct CreateOpts {
    /// name of the new model
    name: String,

    /// base model to build from
    #[arg(long)]
    from: String,

    #[arg(long)]
    system: Option<String>,

    #[arg(long, default_value_t = 0.7)]
    temperature: f64,

    #[arg(long, default_value_t = 4096)]
    context_size: u32,
}

#[derive(Parser, Debug)]
struct DeployOpts {
    name: String,

    #[arg(long)]
    threads: Option<u32>,

    #[arg(long)]
    context_size: Option<u32>,

    #[arg(long)]
    gpu_layers: Option<u32>,

    #[arg(long)]
    temperature: Option<f64>,

    #[arg(long)]
    system_prompt: Option<String>,
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    Show,
    /// keys: serverUrl, metricsServerUrl, darkMode, autoRefresh, refreshInterval
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = Arc::new(FileStore::new(&config.state_path));
    let mut prefs = Preferences::load(store.as_ref())?;

    let mut gateway = GatewayClient::new(&prefs.server_url)
        .with_typing(TypingReveal::from_config(&config.typing));
    if let Some(server) = &cli.server {
        gateway = gateway.with_base_url(server);
    }
    let metrics = MetricsClient::new(&prefs.metrics_url);

    tracing::debug!("Using inference server {}", gateway.base_url());

    match cli.command {
        Commands::Models => {
            let models = gateway.list_models().await?;
            if models.is_empty() {
                println!("No models installed. Pull one with `llmctl pull <name>`.");
            }
            for model in models {
                println!(
                    "{:<40} {:>10} {:<8} {:<8} {}",
                    model.name,
                    model.display_size(),
                    model.details.parameter_size,
                    model.details.quantization_level,
                    model.modified_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Commands::Show { name } => {
            let detail = gateway.show_model_info(&name).await?;
            println!("Family:       {}", detail.details.family);
            println!("Parameters:   {}", detail.details.parameter_size);
            println!("Quantization: {}", detail.details.quantization_level);
            print_section("System prompt", &detail.system_prompt_text);
            print_section("Parameters", &detail.parameters_text);
            print_section("Template", &detail.template_text);
            print_section("Modelfile", &detail.modelfile_text);
            print_section("License", &detail.license);
        }
        Commands::Pull { name } => {
            gateway
                .pull_model(&name, |percent| {
                    print!("\rPulling {}: {:>3}%", name, percent);
                    let _ = std::io::stdout().flush();
                })
                .await?;
            println!("\nPulled {}", name);
        }
        Commands::Rm { name } => {
            gateway.delete_model(&name).await?;
            println!("Deleted {}", name);
        }
        Commands::Create(opts) => {
            let deploy_config = DeployConfig {
                context_size_tokens: opts.context_size,
                system_prompt: opts.system.unwrap_or_default(),
                ..DeployConfig::default()
            }
            .with_temperature(opts.temperature);
            let template = ModelfileTemplate::new(&opts.from, &deploy_config);

            gateway
                .create_model(&opts.name, &template.render(), |status| println!("{}", status))
                .await?;
            println!("Created {}", opts.name);
        }
        Commands::Generate { model, prompt } => {
            println!("{}", gateway.generate(&model, &prompt).await?);
        }
        Commands::Chat { model, system } => run_chat(&gateway, &model, system).await?,
        Commands::System { watch } => {
            let interval = prefs.refresh_interval();
            loop {
                print_snapshot(&metrics.snapshot_or_offline().await);
                if !watch || !prefs.auto_refresh {
                    break;
                }
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = tokio::time::sleep(interval) => println!(),
                }
            }
        }
        Commands::Deploy(opts) => {
            let snapshot = metrics.snapshot_or_offline().await;
            let mut deploy_config = recommended_config(&opts.name, &snapshot);
            if let Some(threads) = opts.threads {
                deploy_config.threads = threads;
            }
            if let Some(context_size) = opts.context_size {
                deploy_config.context_size_tokens = context_size;
            }
            if let Some(gpu_layers) = opts.gpu_layers {
                if gpu_layers > 0 && !gpu_offload_available(&snapshot) {
                    tracing::warn!("No usable GPU reported; ignoring --gpu-layers");
                } else {
                    deploy_config.gpu_layers = gpu_layers;
                }
            }
            if let Some(temperature) = opts.temperature {
                deploy_config = deploy_config.with_temperature(temperature);
            }
            if let Some(prompt) = opts.system_prompt {
                deploy_config.system_prompt = prompt;
            }

            let registry = DeploymentRegistry::new(store.clone(), Arc::new(gateway));
            let record = registry.upsert(&opts.name, &deploy_config).await?;
            println!(
                "Deployed {} (id {}): {} threads, context {}, {} GPU layers",
                record.name,
                record.id,
                record.threads,
                record.context_size_tokens,
                record.gpu_layers
            );
            if multi_gpu_selectable(&snapshot) {
                println!("Multiple GPUs available; using GPU {:?}", deploy_config.selected_gpu_ids);
            }
        }
        Commands::Stop { name } => {
            let registry = DeploymentRegistry::new(store.clone(), Arc::new(gateway));
            registry.set_status(&name, DeploymentStatus::Stopped).await?;
            println!("Stopped {}", name);
        }
        Commands::Start { name } => {
            let registry = DeploymentRegistry::new(store.clone(), Arc::new(gateway));
            let stored = registry
                .stored_deployments()?
                .into_iter()
                .find(|r| r.name == name)
                .ok_or_else(|| format!("No deployment named {}", name))?;

            let deploy_config = DeployConfig {
                threads: stored.threads,
                context_size_tokens: stored.context_size_tokens,
                gpu_layers: stored.gpu_layers,
                ..DeployConfig::default()
            };
            registry.upsert(&name, &deploy_config).await?;
            println!("Started {}", name);
        }
        Commands::Deployments => {
            let registry = DeploymentRegistry::new(store.clone(), Arc::new(gateway));
            let records = registry.list_deployments().await?;
            if records.is_empty() {
                println!("No deployments.");
            }
            for record in records {
                let vram = record
                    .vram_bytes
                    .map(|b| format!("{:.1} GB VRAM", b as f64 / 1e9))
                    .unwrap_or_default();
                println!(
                    "{:<32} {:<8} threads={:<3} ctx={:<6} gpu_layers={:<4} since {} {}",
                    record.name,
                    record.status,
                    record.threads,
                    record.context_size_tokens,
                    record.gpu_layers,
                    record.started_at.format("%Y-%m-%d %H:%M"),
                    vram
                );
            }
        }
        Commands::Settings { action } => {
            if let SettingsAction::Set { key, value } = action {
                if !prefs.apply(&key, &value) {
                    return Err(format!("Invalid setting {}={}", key, value).into());
                }
                prefs.save(store.as_ref())?;
            }
            println!("serverUrl        = {}", prefs.server_url);
            println!("metricsServerUrl = {}", prefs.metrics_url);
            println!("darkMode         = {}", prefs.dark_mode);
            println!("autoRefresh      = {}", prefs.auto_refresh);
            println!("refreshInterval  = {}", prefs.refresh_interval_secs);
        }
    }

    Ok(())
}

async fn run_chat(
    gateway: &GatewayClient,
    model: &str,
    system: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut messages = Vec::new();
    if let Some(prompt) = system.filter(|p| !p.trim().is_empty()) {
        messages.push(ChatMessage::system(prompt));
    }

    println!("Chatting with {}. Empty line or Ctrl-D to quit.", model);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            break;
        }
        messages.push(ChatMessage::user(line));

        // Each update is the whole prefix so far; print only what is new.
        let mut printed = 0;
        let on_update: &mut (dyn FnMut(&str) + Send) = &mut |prefix: &str| {
            if let Some(new) = prefix.get(printed..) {
                print!("{}", new);
                let _ = std::io::stdout().flush();
            }
            printed = prefix.len();
        };

        let reply = gateway.chat(model, &messages, Some(on_update)).await;
        println!();
        messages.push(reply);
    }

    Ok(())
}

fn print_section(title: &str, body: &str) {
    if !body.trim().is_empty() {
        println!("\n{}:\n{}", title, body.trim_end());
    }
}

fn print_snapshot(snapshot: &SystemSnapshot) {
    println!(
        "CPU    {:>5.1}%  ({} cores / {} threads)",
        snapshot.cpu.usage_percent, snapshot.cpu.cores, snapshot.cpu.threads
    );
    println!(
        "Memory {:>5.1}%  ({:.2} / {:.2} GiB)",
        snapshot.memory_usage_percent(),
        snapshot.memory.used_gib,
        snapshot.memory.total_gib
    );
    for gpu in &snapshot.gpus {
        if gpu.is_placeholder() {
            println!("GPU    {}", gpu.name);
        } else {
            println!(
                "GPU {}  {:>5.1}%  {} ({:.1} / {:.1} GiB)",
                gpu.id, gpu.usage_percent, gpu.name, gpu.memory.used_gib, gpu.memory.total_gib
            );
        }
    }
}
