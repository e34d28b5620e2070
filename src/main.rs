use std::{fmt::Debug, path::Path};

use anyhow::Context;
use clap::Parser;

use rosekit::{
    ConvertOptions, DecodeOptions, PoseConverter, Registry, Skeleton, TaggedRecord, TextEncoding,
    UnknownChannelPolicy,
    record::{action, condition, map_block, particle_event},
};

#[derive(clap::Parser)]
struct Args {
    /// text encoding of strings inside the files
    #[arg(long, global = true, default_value = "euc-kr")]
    encoding: String,

    /// ignore animation channels with an unknown track type instead of failing
    #[arg(long, global = true)]
    skip_unknown_channels: bool,

    #[command(subcommand)]
    subcommand: Subcommands,
}

#[derive(clap::Subcommand, Clone)]
enum Subcommands {
    Skeleton(SkeletonCommand),
    Animation(AnimationCommand),
    Convert(ConvertCommand),
    Records(RecordsCommand),
}

/// Print the bone tree of a ZMD skeleton
#[derive(clap::Args, Clone)]
struct SkeletonCommand {
    /// path to zmd file
    path: String,
}

/// Print the header and channels of a ZMO animation
#[derive(clap::Args, Clone)]
struct AnimationCommand {
    /// path to the zmd file the animation targets
    skeleton: String,
    /// path to zmo file
    path: String,
}

/// Print the converted pose of every animated bone at every frame
#[derive(clap::Args, Clone)]
struct ConvertCommand {
    /// path to the zmd file the animation targets
    skeleton: String,
    /// path to zmo file
    path: String,
    /// scale applied to root translations
    #[arg(long, default_value_t = 0.01)]
    unit_scale: f32,
}

/// Dump a tagged record container
#[derive(clap::Args, Clone)]
struct RecordsCommand {
    family: RecordFamily,
    /// path to container file
    path: String,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum RecordFamily {
    Action,
    Condition,
    ParticleEvent,
    MapBlock,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let text = TextEncoding::for_label(&args.encoding)
        .ok_or_else(|| anyhow::anyhow!("unknown text encoding: {}", args.encoding))?;
    let options = DecodeOptions {
        text,
        unknown_channels: if args.skip_unknown_channels {
            UnknownChannelPolicy::Skip
        } else {
            UnknownChannelPolicy::Reject
        },
    };

    match args.subcommand {
        Subcommands::Skeleton(args) => {
            print_skeleton(&args.path, &options)?;
        }
        Subcommands::Animation(args) => {
            print_animation(&args.skeleton, &args.path, &options)?;
        }
        Subcommands::Convert(args) => {
            convert(&args.skeleton, &args.path, args.unit_scale, &options)?;
        }
        Subcommands::Records(args) => match args.family {
            RecordFamily::Action => dump_records(&args.path, action::registry(), &options)?,
            RecordFamily::Condition => {
                dump_records(&args.path, condition::registry(), &options)?
            }
            RecordFamily::ParticleEvent => {
                dump_records(&args.path, particle_event::registry(), &options)?
            }
            RecordFamily::MapBlock => dump_records(&args.path, map_block::registry(), &options)?,
        },
    }

    Ok(())
}

fn read_file(path: impl AsRef<Path>) -> anyhow::Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).with_context(|| format!("unable to read {}", path.display()))
}

fn load_skeleton(path: &str, options: &DecodeOptions) -> anyhow::Result<Skeleton> {
    let bytes = read_file(path)?;
    rosekit::decode_skeleton_with(&bytes, options)
        .with_context(|| format!("unable to decode skeleton {path}"))
}

fn print_skeleton(path: &str, options: &DecodeOptions) -> anyhow::Result<()> {
    let skeleton = load_skeleton(path, options)?;

    println!(
        "{:?}: {} bones, {} dummies",
        skeleton.version(),
        skeleton.bones().len(),
        skeleton.dummies().len()
    );

    let mut stack = skeleton.roots().collect::<Vec<_>>();
    stack.reverse();
    while let Some(index) = stack.pop() {
        let bone = &skeleton.bones()[index];
        let position = bone.absolute_transform().transform_point3(glam::Vec3::ZERO);
        println!(
            "{:indent$}{index:>3} {} @ {position}",
            "",
            bone.name,
            indent = skeleton.depth(index).unwrap_or(0) * 2
        );

        let mut children = skeleton.children(index).collect::<Vec<_>>();
        children.reverse();
        stack.extend(children);
    }

    for dummy in skeleton.dummies() {
        let parent = dummy.parent.map_or("-", |p| skeleton.bones()[p].name.as_str());
        println!("dummy {} on {} @ {}", dummy.name, parent, dummy.translation);
    }

    Ok(())
}

fn print_animation(skeleton: &str, path: &str, options: &DecodeOptions) -> anyhow::Result<()> {
    let skeleton = load_skeleton(skeleton, options)?;
    let bytes = read_file(path)?;
    let animation = rosekit::decode_animation_with(&bytes, &skeleton, options)
        .with_context(|| format!("unable to decode animation {path}"))?;

    println!(
        "{} frames at {} fps ({:.2}s), {} channels",
        animation.num_frames(),
        animation.fps(),
        animation.duration(),
        animation.channels().len()
    );
    for channel in animation.channels() {
        println!(
            "{:?} -> {} ({})",
            channel.track, skeleton.bones()[channel.bone].name, channel.bone
        );
    }

    Ok(())
}

fn convert(
    skeleton: &str,
    path: &str,
    unit_scale: f32,
    options: &DecodeOptions,
) -> anyhow::Result<()> {
    let skeleton = load_skeleton(skeleton, options)?;
    let bytes = read_file(path)?;
    let animation = rosekit::decode_animation_with(&bytes, &skeleton, options)
        .with_context(|| format!("unable to decode animation {path}"))?;

    let converter = PoseConverter::new(ConvertOptions {
        unit_scale,
        ..Default::default()
    });
    let samples = converter.convert_all(&skeleton, &animation)?;

    for sample in &samples {
        println!(
            "{} frame {}: translation {} axis {} angle {:.4} scale {}",
            skeleton.bones()[sample.bone].name,
            sample.frame,
            sample.translation,
            sample.axis,
            sample.angle,
            sample.scale
        );
    }

    Ok(())
}

fn dump_records<R: TaggedRecord + Debug>(
    path: &str,
    registry: &Registry<R>,
    options: &DecodeOptions,
) -> anyhow::Result<()> {
    let bytes = read_file(path)?;
    let records = rosekit::decode_tagged_container_with(&bytes, registry, options)
        .with_context(|| format!("unable to decode {} records in {path}", registry.family()))?;

    for record in &records {
        let name = registry
            .resolve(record.tag())
            .map_or("?", |kind| kind.name);
        println!("{name}: {record:#?}");
    }

    println!("{} {} records", records.len(), registry.family());

    Ok(())
}
