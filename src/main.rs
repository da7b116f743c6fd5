use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::info;
use ringbuf::traits::{Consumer, Producer};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use storyboard_studio::audio::export::ExportSettings;
use storyboard_studio::project::serialization::{export_json, export_scenes_csv};
use storyboard_studio::{
    Autosaver, EditAction, EditorMessage, EditorState, FileStore, NarrationExporter,
    ProjectLoadOptions, ProjectManager, ProjectSnapshot, StudioConfig, WavHeader,
    create_editor_channel, create_notification_channel, decode_wav, encode_wav,
};

#[derive(Parser, Debug)]
#[command(name = "storyboard-studio")]
#[command(about = "Author short-form video storyboards", long_about = None)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "STORYBOARD_STUDIO_CONFIG")]
    config: Option<PathBuf>,

    /// Override the storage directory from the config
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new project, replacing the saved one
    New {
        #[arg(short, long, default_value = "Untitled Storyboard")]
        title: String,

        /// Story theme
        #[arg(long)]
        theme: Option<String>,
    },

    /// Print a summary of the saved project
    Show,

    /// Write the whole document as pretty JSON
    ExportJson { output: PathBuf },

    /// Write the scene list as CSV
    ExportCsv { output: PathBuf },

    /// Wrap raw 16-bit mono PCM in a WAV container
    EncodeWav {
        input: PathBuf,
        output: PathBuf,

        #[arg(long)]
        sample_rate: Option<u32>,
    },

    /// Write scene_<n>.wav for every scene with narration
    ExportNarration { out_dir: PathBuf },

    /// Archived versions of the story and scenes
    #[command(subcommand)]
    Version(VersionCommand),

    /// Print the header and duration of a WAV file
    Inspect { input: PathBuf },
}

#[derive(Subcommand, Debug)]
enum VersionCommand {
    /// Archive the current story and scenes
    Save {
        #[arg(default_value = "")]
        label: String,
    },
    List,
    /// Replace the story and scenes with an archived version
    Restore { id: String },
}

struct Session {
    config: StudioConfig,
    manager: ProjectManager,
    store: FileStore,
}

impl Session {
    fn open(args: &Args) -> anyhow::Result<Self> {
        let mut config = StudioConfig::load_or_default(args.config.as_deref())
            .context("Failed to load configuration")?;
        if let Some(dir) = &args.storage_dir {
            config.storage_dir = dir.clone();
        }

        let mut manager = ProjectManager::new();
        let mut idea = manager.create_new_project(String::new()).idea;
        idea.voice = config.default_voice.clone();
        manager = manager.with_default_idea(idea);

        let store = FileStore::new(config.storage_dir.clone());
        Ok(Self {
            config,
            manager,
            store,
        })
    }

    fn load(&self) -> anyhow::Result<ProjectSnapshot> {
        self.manager
            .load_or_create(&self.store, &ProjectLoadOptions::default())
            .context("Failed to load project")
    }

    fn save(&mut self, project: &ProjectSnapshot) -> anyhow::Result<()> {
        self.manager
            .save_project(&mut self.store, project)
            .context("Failed to save project")
    }

    /// Apply one edit through the editor queue and persist the result
    fn edit(&mut self, action: EditAction) -> anyhow::Result<ProjectSnapshot> {
        let (notification_tx, mut notification_rx) =
            create_notification_channel(self.config.notification_capacity);
        let (mut message_tx, mut message_rx) = create_editor_channel(self.config.message_capacity);

        let mut editor = EditorState::with_history_limit(self.load()?, self.config.history_limit)
            .with_notifications(Arc::new(Mutex::new(notification_tx)));
        let mut autosaver = Autosaver::new(self.manager.clone(), self.config.autosave_delay())
            .assume_saved(editor.revision());

        let description = action.description();
        if message_tx.try_push(EditorMessage::Edit(action)).is_err() {
            bail!("Editor queue is full");
        }
        let changed = editor.drain(&mut message_rx);

        if let Some(notification) = notification_rx.try_pop() {
            bail!("Edit rejected: {}: {}", description, notification);
        }
        if changed == 0 {
            info!("{} changed nothing", description);
        }

        // One-shot process: write now instead of waiting out the debounce
        autosaver
            .flush(&mut editor, &mut self.store, Instant::now())
            .context("Failed to save project")?;
        Ok(editor.project().clone())
    }
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> anyhow::Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

fn print_summary(project: &ProjectSnapshot) {
    println!("{} ({})", project.title, project.id);
    println!(
        "  Idea: \"{}\", {} for {} ({}s)",
        project.idea.theme, project.idea.genre, project.idea.platform, project.idea.duration
    );
    println!("  Characters: {}", project.characters.len());
    for character in &project.characters {
        println!("    - {} ({})", character.name, character.role);
    }
    println!(
        "  Scenes: {} ({:.1}s total)",
        project.scenes.len(),
        project.total_duration()
    );
    for scene in &project.scenes {
        println!(
            "    {:>2}. {} [{:.1}s] image: {:?}, audio: {:?}",
            scene.order + 1,
            scene.title,
            scene.duration,
            scene.image.status,
            scene.audio_status()
        );
    }
    println!("  Versions: {}", project.versions.len());
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut session = Session::open(&args)?;

    match args.command {
        Command::New { title, theme } => {
            let mut project = session.manager.create_new_project(title);
            if let Some(theme) = theme {
                project.idea.theme = theme;
            }
            session.save(&project)?;
            info!("Created project {}", project.id);
            print_summary(&project);
        }
        Command::Show => print_summary(&session.load()?),
        Command::ExportJson { output } => {
            let json = export_json(&session.load()?)?;
            write_file(&output, json)?;
            info!("Wrote {}", output.display());
        }
        Command::ExportCsv { output } => {
            let csv = export_scenes_csv(&session.load()?.scenes);
            write_file(&output, csv)?;
            info!("Wrote {}", output.display());
        }
        Command::EncodeWav {
            input,
            output,
            sample_rate,
        } => {
            let pcm = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            if pcm.is_empty() {
                bail!("{} contains no PCM data", input.display());
            }
            let rate = sample_rate.unwrap_or(session.config.narration_sample_rate);
            write_file(&output, encode_wav(&pcm, rate))?;
            info!("Wrote {} ({} bytes of PCM at {} Hz)", output.display(), pcm.len(), rate);
        }
        Command::ExportNarration { out_dir } => {
            let exporter = NarrationExporter::new(ExportSettings {
                sample_rate: session.config.narration_sample_rate,
                ..Default::default()
            });
            let written = exporter.export_all(&session.load()?, &out_dir)?;
            for path in &written {
                println!("{}", path.display());
            }
        }
        Command::Version(VersionCommand::Save { label }) => {
            let project = session.edit(EditAction::ArchiveVersion { label })?;
            if let Some(version) = project.versions.last() {
                println!("Saved {} ({})", version.label, version.id);
            }
        }
        Command::Version(VersionCommand::List) => {
            let project = session.load()?;
            for version in &project.versions {
                println!(
                    "{}  {}  {} ({} scenes)",
                    version.id,
                    version.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    version.label,
                    version.snapshot.scenes.len()
                );
            }
        }
        Command::Version(VersionCommand::Restore { id }) => {
            let project = session.edit(EditAction::RestoreVersion { id })?;
            print_summary(&project);
        }
        Command::Inspect { input } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let header = WavHeader::parse(&bytes)?;
            let decoded = decode_wav(&bytes)?;
            println!("{}", input.display());
            println!("  Sample rate: {} Hz", header.sample_rate);
            println!("  Channels: {}", header.num_channels);
            println!("  Bits per sample: {}", header.bits_per_sample);
            println!("  Byte rate: {}", header.byte_rate());
            println!("  Data: {} bytes", header.data_len);
            println!("  Duration: {:.3}s", decoded.duration_secs());
        }
    }

    Ok(())
}
