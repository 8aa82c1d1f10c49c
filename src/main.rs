use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};
use log::info;

use clustered_shading::{
    cluster_shader_source, ClusterConfig, ClusterGrid, GridDims, LightClusterAssigner, Scene,
};

/// Bind group index used for the cluster bindings in emitted shaders.
const SHADER_BIND_GROUP: u32 = 2;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let xml = fs::read_to_string(&options.path)
        .with_context(|| format!("failed to read scene {}", options.path))?;
    let scene = Scene::from_xml(&xml).context("failed to parse scene XML")?;

    println!(
        "Loaded scene with {} objects ({} lights)",
        scene.objects.len(),
        scene.lights.len()
    );

    let config = options.cluster_config(scene.clusters);
    let mut grid = ClusterGrid::new(&config).context("invalid cluster configuration")?;
    let frame = scene.frame_input();
    info!(
        "camera near={} far={} fov={} aspect={}",
        frame.camera.near, frame.camera.far, frame.camera.fov, frame.camera.aspect
    );

    LightClusterAssigner::update(&mut grid, &frame);

    let layout = grid.layout();
    println!(
        "Cluster grid {}: {} clusters, element size {}, up to {} lights each",
        layout.dims(),
        layout.element_count(),
        layout.element_size(),
        layout.max_lights_per_cluster()
    );
    println!(
        "Occupied clusters: {}/{}",
        grid.occupied_clusters(),
        layout.element_count()
    );
    println!("Light assignments: {}", grid.total_assignments());

    if options.dump {
        print_clusters(&grid);
    }
    if options.emit_shader {
        println!("{}", cluster_shader_source(layout, SHADER_BIND_GROUP));
    }
    Ok(())
}

fn print_clusters(grid: &ClusterGrid) {
    let layout = grid.layout();
    for cluster in 0..layout.element_count() {
        if grid.count(cluster) == 0 {
            continue;
        }
        let (x, y, z) = layout.unflatten(cluster);
        let lights: Vec<u32> = grid.light_indices(cluster).collect();
        println!(" - cluster {cluster} ({x}, {y}, {z}): {lights:?}");
    }
}

struct CliOptions {
    path: String,
    dims: Option<GridDims>,
    max_lights: Option<u32>,
    dump: bool,
    emit_shader: bool,
}

impl CliOptions {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: clustered-shading <scene.xml> [--dims NXxNYxNZ] [--max-lights N] [--dump] [--emit-shader]"
            ));
        };
        let mut options = Self {
            path,
            dims: None,
            max_lights: None,
            dump: false,
            emit_shader: false,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--dims" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--dims expects a value such as 16x8x24"))?;
                    options.dims = Some(value.parse()?);
                }
                "--max-lights" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--max-lights expects a number"))?;
                    let max = value
                        .parse::<u32>()
                        .with_context(|| format!("invalid --max-lights value {value:?}"))?;
                    options.max_lights = Some(max);
                }
                "--dump" => options.dump = true,
                "--emit-shader" => options.emit_shader = true,
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --dims, --max-lights, --dump or --emit-shader"
                    ));
                }
            }
        }
        Ok(options)
    }

    /// Flags win over the scene's `<clusters>` block, which wins over defaults.
    fn cluster_config(&self, scene: Option<ClusterConfig>) -> ClusterConfig {
        let mut config = scene.unwrap_or_default();
        if let Some(dims) = self.dims {
            config.dims = dims;
        }
        if let Some(max) = self.max_lights {
            config.max_lights_per_cluster = max;
        }
        config
    }
}
