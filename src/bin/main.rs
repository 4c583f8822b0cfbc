//! ChatAvatar Import CLI
//!
//! Inspect ChatAvatar packs, plan imports and rebuild converted models as USDA.

use chatavatar_import::{
    generate_mtl_files, load_gltf, load_pack, write_usda, AdditionalElements, PackVariant,
    ReconstructConfig, Reconstructor, TextureResolution, Topology, UnpackMode,
    UsdExportOptions,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatavatar-import")]
#[command(author, version, long_about = None)]
#[command(about = "Import ChatAvatar packs and rebuild their meshes as USD")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the variants and optional elements of a pack
    Info {
        /// Path to the pack archive
        pack: PathBuf,
    },

    /// Resolve a selection to a model, anchor object and materials
    Plan {
        /// Path to the pack archive
        pack: PathBuf,

        /// Texture resolution
        #[arg(short, long, value_enum, default_value = "2k")]
        resolution: ResolutionArg,

        /// Mesh topology
        #[arg(short, long, value_enum, default_value = "default")]
        topology: TopologyArg,

        /// Optional elements to include
        #[arg(short, long, value_enum)]
        with: Vec<PartArg>,

        /// Extract next to the archive instead of a temporary directory,
        /// and write missing OBJ material libraries
        #[arg(long)]
        local: bool,
    },

    /// Rebuild a converted glTF model and write it as USDA
    Convert {
        /// Input glTF JSON document
        input: PathBuf,

        /// Output USDA file path
        #[arg(short, long)]
        output: PathBuf,

        /// Catmull-Clark refinement level
        #[arg(long)]
        subdivide: Option<u32>,

        /// Skip blend shapes
        #[arg(long)]
        no_blend_shapes: bool,

        /// Skip the skeleton and joint influences
        #[arg(long)]
        no_skinning: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ResolutionArg {
    /// 2048px textures
    #[value(name = "2k")]
    TwoK,
    /// 4096px textures
    #[value(name = "4k")]
    FourK,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TopologyArg {
    /// MetaHuman-compatible head
    Metahuman,
    /// ChatAvatar default topology
    Default,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PartArg {
    RiggedBody,
    Components,
    BlendShapes,
    BackHeadTexture,
}

impl From<ResolutionArg> for TextureResolution {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::TwoK => TextureResolution::TwoK,
            ResolutionArg::FourK => TextureResolution::FourK,
        }
    }
}

impl From<TopologyArg> for Topology {
    fn from(arg: TopologyArg) -> Self {
        match arg {
            TopologyArg::Metahuman => Topology::MetaHuman,
            TopologyArg::Default => Topology::Default,
        }
    }
}

impl From<PartArg> for AdditionalElements {
    fn from(arg: PartArg) -> Self {
        match arg {
            PartArg::RiggedBody => AdditionalElements::RIGGED_BODY,
            PartArg::Components => AdditionalElements::COMPONENTS,
            PartArg::BlendShapes => AdditionalElements::BLEND_SHAPES,
            PartArg::BackHeadTexture => AdditionalElements::BACK_HEAD_TEXTURE,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { pack } => {
            show_pack_info(&pack)?;
        }
        Commands::Plan {
            pack,
            resolution,
            topology,
            with,
            local,
        } => {
            let variant = PackVariant::new(resolution.into(), topology.into());
            let selected = with.into_iter().fold(AdditionalElements::empty(), |acc, part| {
                acc | AdditionalElements::from(part)
            });
            plan_import(&pack, variant, selected, local)?;
        }
        Commands::Convert {
            input,
            output,
            subdivide,
            no_blend_shapes,
            no_skinning,
        } => {
            let mut config = ReconstructConfig::default();
            if no_blend_shapes {
                config = config.without_blend_shapes();
            }
            if no_skinning {
                config = config.without_skinning();
            }
            let options = UsdExportOptions {
                subdivision_level: subdivide,
                ..Default::default()
            };
            convert_model(&input, &output, config, &options)?;
        }
    }

    Ok(())
}

fn show_pack_info(pack_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading pack from {:?}...", pack_path);
    let pack = load_pack(pack_path, UnpackMode::Temp)?;

    println!("\nPack Info:");
    println!("  Name: {}", pack.pack_name);
    println!("  Entries: {}", pack.entries.len());
    println!("  Variants:");
    for variant in &pack.available_variants {
        println!(
            "    - {} ({}, {}px)",
            variant.pack_name(),
            variant,
            variant.resolution.pixels()
        );
    }
    println!("  Additional elements: {}", pack.additional);
    if !pack.prompt.is_empty() {
        println!("  Prompt: {}", pack.prompt);
    }

    Ok(())
}

fn plan_import(
    pack_path: &PathBuf,
    variant: PackVariant,
    selected: AdditionalElements,
    local: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mode = if local { UnpackMode::Local } else { UnpackMode::Temp };
    println!("Loading pack from {:?}...", pack_path);
    let pack = load_pack(pack_path, mode)?;

    let selection = pack.resolve(variant, selected)?;
    let model_path = selection.model_path_in(&pack.root);

    println!("\nImport plan for {} with {}:", variant, selection.selected);
    println!("  Model: {}", model_path.display());
    println!("  Anchor object: {}", selection.anchor_object);
    println!(
        "  Textures: {}, {}, {}",
        selection.textures.diffuse, selection.textures.normal, selection.textures.specular
    );
    if let Some(backhead) = &selection.backhead_textures {
        println!(
            "  Back head textures: {}, {}, {}",
            backhead.diffuse, backhead.normal, backhead.specular
        );
    }
    let materials: Vec<&str> = selection.materials.iter().map(|m| m.name()).collect();
    println!("  Materials: {}", materials.join(", "));

    if local && model_path.extension().is_some_and(|e| e == "obj") {
        for created in generate_mtl_files(&model_path)? {
            println!("  Created material library {:?}", created);
        }
    }

    Ok(())
}

fn convert_model(
    input_path: &PathBuf,
    output_path: &PathBuf,
    config: ReconstructConfig,
    options: &UsdExportOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading model from {:?}...", input_path);
    let scene = load_gltf(input_path)?;
    println!(
        "  Found {} nodes, {} meshes, {} skins",
        scene.nodes.len(),
        scene.meshes.len(),
        scene.skins.len()
    );

    let mesh = Reconstructor::with_config(config).reconstruct(&scene)?;
    println!(
        "  Rebuilt {} points, {} faces ({} quads), {} blend shapes",
        mesh.vertex_count(),
        mesh.face_count(),
        mesh.quad_count(),
        mesh.blend_shapes.len()
    );
    if let Some(skeleton) = &mesh.skeleton {
        println!("  Skeleton {} with {} joints", skeleton.name, skeleton.joints.len());
    }

    write_usda(&mesh, output_path, options)?;
    println!("Exported USDA to {:?}", output_path);

    Ok(())
}
