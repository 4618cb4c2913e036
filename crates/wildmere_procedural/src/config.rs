//! # World Configuration
//!
//! All balance data lives in TOML files loaded once at startup. Every table
//! has a `Default`, so a file only needs to mention what it changes.
//!
//! ```toml
//! seed = 12345
//! half_extent = [256, 256]
//! chunk_size = 64
//!
//! [[biomes]]
//! name = "plains"
//! color = [120, 180, 80]
//!
//! [[placement]]
//! biome = "plains"
//! kind = 1
//! target_per_chunk = 10
//! mode = "uniform"
//! ```
//!
//! Structural problems are rejected by `validate`. Soft defects (interval
//! gaps, unknown biome names) are left for the layers to warn about.

use std::path::Path;

use serde::{Deserialize, Serialize};
use wildmere_shared::DEFAULT_CHUNK_SIZE;

use crate::error::{WorldgenError, WorldgenResult};
use crate::reservation::ReservationMask;

/// Widest spacing, in chunks, a neighbor scan may cover.
pub const MAX_SPACING_CHUNKS: u32 = 8;

/// Top-level world configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed.
    pub seed: u64,
    /// Half extent of the bounded climate grid, in cells (minimum 1×1).
    pub half_extent: [u32; 2],
    /// Chunk width/height in cells, shared by planners and streamers.
    pub chunk_size: u32,
    /// World units per cell.
    pub cell_size: f32,
    /// Climate layer settings and zone table.
    pub climate: ClimateConfig,
    /// Biome catalog (metadata only).
    pub biomes: Vec<BiomeDef>,
    /// Object placement rules.
    pub placement: Vec<PlacementRuleDef>,
    /// Camp planner settings.
    pub camps: CampConfig,
    /// Creature group planner settings.
    pub creatures: CreatureConfig,
    /// Streaming controller settings.
    pub streaming: StreamingConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            half_extent: [256, 256],
            chunk_size: DEFAULT_CHUNK_SIZE,
            cell_size: 1.0,
            climate: ClimateConfig::default(),
            biomes: default_biomes(),
            placement: default_placement(),
            camps: CampConfig::default(),
            creatures: CreatureConfig::default(),
            streaming: StreamingConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema or the
    /// result fails `validate`.
    pub fn from_toml_str(text: &str) -> WorldgenResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> WorldgenResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Rejects configurations the generators cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first structural problem.
    pub fn validate(&self) -> WorldgenResult<()> {
        if self.chunk_size == 0 {
            return Err(WorldgenError::InvalidConfig("chunk_size must be positive".into()));
        }
        if self.half_extent[0] < 1 || self.half_extent[1] < 1 {
            return Err(WorldgenError::InvalidConfig(format!(
                "half_extent must be at least 1x1, got {}x{}",
                self.half_extent[0], self.half_extent[1]
            )));
        }
        if !(self.cell_size > 0.0) {
            return Err(WorldgenError::InvalidConfig("cell_size must be positive".into()));
        }
        if self.climate.zones.is_empty() {
            return Err(WorldgenError::InvalidConfig("at least one climate zone is required".into()));
        }
        if self.creatures.step == 0 {
            return Err(WorldgenError::InvalidConfig("creatures.step must be positive".into()));
        }
        let max_spacing = MAX_SPACING_CHUNKS.saturating_mul(self.chunk_size) as f32;
        for (name, spacing) in [
            ("camps.min_distance_between_camps", self.camps.min_distance_between_camps),
            ("creatures.min_group_distance", self.creatures.min_group_distance),
        ] {
            if !(0.0..=max_spacing).contains(&spacing) {
                return Err(WorldgenError::InvalidConfig(format!(
                    "{name} must be within 0..={max_spacing} ({MAX_SPACING_CHUNKS} chunks), got {spacing}"
                )));
            }
        }
        for (name, streamer) in self.streaming.named() {
            if streamer.keep_padding < streamer.load_padding {
                return Err(WorldgenError::InvalidConfig(format!(
                    "streaming.{name}: keep_padding ({}) must not be below load_padding ({})",
                    streamer.keep_padding, streamer.load_padding
                )));
            }
            if streamer.chunk_size == Some(0) {
                return Err(WorldgenError::InvalidConfig(format!(
                    "streaming.{name}: chunk_size must be positive"
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// CLIMATE & BIOMES
// =============================================================================

/// Climate layer settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateConfig {
    /// Latitude perturbation strength; the percentile moves by up to `±strength·50`.
    pub noise_strength: f64,
    /// Lower bound of the seed-derived climate noise scale.
    pub noise_scale_min: f64,
    /// Upper bound of the seed-derived climate noise scale.
    pub noise_scale_max: f64,
    /// Octaves of the climate perturbation noise.
    pub octaves: u32,
    /// Connected same-zone regions smaller than this are merged away.
    pub min_region_size: u32,
    /// Scale of the biome-selection noise channel.
    pub biome_noise_scale: f64,
    /// Zone table; any order, sorted at load.
    pub zones: Vec<ClimateZoneDef>,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            noise_strength: 0.25,
            noise_scale_min: 0.008,
            noise_scale_max: 0.02,
            octaves: 3,
            min_region_size: 48,
            biome_noise_scale: 0.045,
            zones: default_zones(),
        }
    }
}

/// One latitude band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClimateZoneDef {
    /// Zone name.
    pub name: String,
    /// Inclusive start of the band, latitude percentile.
    pub start_percent: f64,
    /// Exclusive end of the band (inclusive for the last zone).
    pub end_percent: f64,
    /// Biome used when the noise sample falls outside every interval.
    pub default_biome: String,
    /// Noise intervals selecting biomes; should cover `[0, 1)`.
    #[serde(default)]
    pub biome_chances: Vec<BiomeChanceDef>,
}

/// A `[min, max)` interval of biome-noise values mapped to one biome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeChanceDef {
    /// Biome name.
    pub biome: String,
    /// Inclusive lower bound.
    pub min: f64,
    /// Exclusive upper bound.
    pub max: f64,
}

/// Biome metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeDef {
    /// Biome name, referenced by zones and rules.
    pub name: String,
    /// Display color (RGB).
    pub color: [u8; 3],
}

// =============================================================================
// OBJECT PLACEMENT
// =============================================================================

/// Placement strategy of a rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// Independent uniformly random cells.
    #[default]
    Uniform,
    /// Seed cells with nearby satellites.
    Clustered,
    /// One candidate per step-grid cell.
    BlueNoise,
}

/// Noise threshold gate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseGateDef {
    /// Noise scale.
    pub scale: f64,
    /// Cells sampling below this value are rejected.
    pub threshold: f64,
}

/// Cluster shape for `Clustered` rules.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterDef {
    /// Minimum satellites per seed.
    pub min_satellites: u32,
    /// Maximum satellites per seed.
    pub max_satellites: u32,
    /// Satellite scatter radius, in cells.
    pub radius: u32,
}

impl Default for ClusterDef {
    fn default() -> Self {
        Self {
            min_satellites: 2,
            max_satellites: 5,
            radius: 4,
        }
    }
}

/// Requirement that another biome lies within a radius.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearbyBiomeDef {
    /// Required neighboring biome.
    pub biome: String,
    /// Search radius in cells.
    pub radius: u32,
}

/// One placement rule of one biome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementRuleDef {
    /// Biome the rule applies to.
    pub biome: String,
    /// Object type placed.
    pub kind: u32,
    /// Instances per fully covered chunk.
    pub target_per_chunk: u32,
    /// Multiplier on `target_per_chunk`.
    pub density: f64,
    /// Placement strategy.
    pub mode: PlacementMode,
    /// Higher priority rules place first.
    pub priority: i32,
    /// Footprint in cells, `[width, height]`, anchored at the placed cell.
    pub footprint: [u32; 2],
    /// Number of visual variants.
    pub variants: u32,
    /// Spacing between instances of this rule (`BlueNoise` step).
    pub min_distance_same_type: f32,
    /// Reject cells within this radius of anything already placed.
    pub avoid_radius: Option<f32>,
    /// Optional noise gate.
    pub noise: Option<NoiseGateDef>,
    /// Cluster shape (`Clustered` only).
    pub cluster: ClusterDef,
    /// Optional neighboring-biome requirement.
    pub requires_nearby_biome: Option<NearbyBiomeDef>,
    /// Reservation bits that veto this rule.
    pub avoid_mask: ReservationMask,
}

impl Default for PlacementRuleDef {
    fn default() -> Self {
        Self {
            biome: String::new(),
            kind: 0,
            target_per_chunk: 0,
            density: 1.0,
            mode: PlacementMode::Uniform,
            priority: 0,
            footprint: [1, 1],
            variants: 1,
            min_distance_same_type: 4.0,
            avoid_radius: None,
            noise: None,
            cluster: ClusterDef::default(),
            requires_nearby_biome: None,
            avoid_mask: ReservationMask::NATURE,
        }
    }
}

// =============================================================================
// CAMPS
// =============================================================================

/// How structures of one type are laid out around the camp center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureDistribution {
    /// At the center.
    Center,
    /// Evenly around a ring of `radius`.
    #[default]
    Ring,
    /// Evenly around a ring of half `radius`.
    InnerRing,
    /// On a square grid with `radius` spacing.
    Grid,
    /// Randomly inside a disc of `radius`.
    RandomScatter,
}

/// Role of a structure, used as an NPC anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureRole {
    /// Sleeping tent.
    Tent,
    /// Campfire.
    Fire,
    /// Gate or entrance.
    Gate,
    /// Anything else.
    #[default]
    Prop,
}

/// One structure type of a camp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureDef {
    /// Object type of the structure.
    pub kind: u32,
    /// Anchor role.
    pub role: StructureRole,
    /// Inclusive count range.
    pub count: [u32; 2],
    /// Layout.
    pub distribution: StructureDistribution,
    /// Layout radius (or grid spacing), in cells.
    pub radius: f32,
    /// Footprint `[width, height]`.
    pub footprint: [u32; 2],
    /// Minimum distance between structures of this type.
    pub min_spacing: f32,
    /// Number of visual variants.
    pub variants: u32,
}

impl Default for StructureDef {
    fn default() -> Self {
        Self {
            kind: 0,
            role: StructureRole::Prop,
            count: [1, 1],
            distribution: StructureDistribution::Ring,
            radius: 5.0,
            footprint: [1, 1],
            min_spacing: 2.0,
            variants: 1,
        }
    }
}

/// Where an NPC slot is anchored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcAnchor {
    /// Near the center, jittered.
    #[default]
    Center,
    /// On the perimeter ring, spread by angle.
    Perimeter,
    /// Next to a tent.
    NearTents,
    /// Next to a fire.
    NearFire,
    /// Next to a gate.
    NearGate,
    /// Anywhere inside the footprint.
    Anywhere,
}

/// One NPC entry of a camp roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcEntryDef {
    /// NPC profile reference.
    pub profile: u32,
    /// Inclusive count range.
    pub count: [u32; 2],
    /// Anchor strategy.
    pub anchor: NpcAnchor,
    /// Positional jitter around the anchor, in cells.
    pub jitter: f32,
    /// Minimum spacing to other NPCs and occupied cells.
    pub min_spacing: f32,
}

impl Default for NpcEntryDef {
    fn default() -> Self {
        Self {
            profile: 0,
            count: [1, 1],
            anchor: NpcAnchor::Center,
            jitter: 2.0,
            min_spacing: 1.5,
        }
    }
}

/// Camp planner settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampConfig {
    /// Disables camp planning entirely when false.
    pub enabled: bool,
    /// Salt separating camp randomness from other planners.
    pub salt: u64,
    /// Biomes a camp center may sit in.
    pub allowed_biomes: Vec<String>,
    /// Optional noise gate on the candidate center.
    pub noise: Option<NoiseGateDef>,
    /// Minimum distance between camp centers, in cells.
    pub min_distance_between_camps: f32,
    /// Footprint radius reserved under Camps+Nature.
    pub footprint_radius: u32,
    /// Extra ring beyond the footprint reserved under Creatures.
    pub no_spawn_ring: u32,
    /// Structure types.
    pub structures: Vec<StructureDef>,
    /// NPC roster.
    pub npcs: Vec<NpcEntryDef>,
}

impl Default for CampConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            salt: 0xCA_4D,
            allowed_biomes: vec!["plains".into(), "forest".into(), "steppe".into()],
            noise: None,
            min_distance_between_camps: 96.0,
            footprint_radius: 9,
            no_spawn_ring: 6,
            structures: vec![
                StructureDef {
                    kind: 100,
                    role: StructureRole::Fire,
                    count: [1, 1],
                    distribution: StructureDistribution::Center,
                    radius: 0.0,
                    footprint: [1, 1],
                    min_spacing: 0.0,
                    variants: 1,
                },
                StructureDef {
                    kind: 101,
                    role: StructureRole::Tent,
                    count: [3, 5],
                    distribution: StructureDistribution::Ring,
                    radius: 5.0,
                    footprint: [2, 2],
                    min_spacing: 3.0,
                    variants: 2,
                },
                StructureDef {
                    kind: 102,
                    role: StructureRole::Gate,
                    count: [1, 1],
                    distribution: StructureDistribution::RandomScatter,
                    radius: 8.0,
                    footprint: [1, 1],
                    min_spacing: 0.0,
                    variants: 1,
                },
            ],
            npcs: vec![
                NpcEntryDef {
                    profile: 200,
                    count: [1, 2],
                    anchor: NpcAnchor::NearFire,
                    jitter: 2.0,
                    min_spacing: 1.5,
                },
                NpcEntryDef {
                    profile: 201,
                    count: [2, 3],
                    anchor: NpcAnchor::Perimeter,
                    jitter: 1.0,
                    min_spacing: 2.0,
                },
                NpcEntryDef {
                    profile: 202,
                    count: [0, 1],
                    anchor: NpcAnchor::NearGate,
                    jitter: 1.0,
                    min_spacing: 1.5,
                },
            ],
        }
    }
}

// =============================================================================
// CREATURES
// =============================================================================

/// One member type of a creature group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberDef {
    /// Creature profile reference.
    pub profile: u32,
    /// Inclusive count range.
    pub count: [u32; 2],
}

/// A weighted group profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupDef {
    /// Group profile reference.
    pub profile: u32,
    /// Selection weight.
    pub weight: u32,
    /// Members spread on a ring of this radius, in cells.
    pub cohesion_radius: f32,
    /// Per-member random offset, in cells.
    pub jitter: f32,
    /// Member types.
    pub members: Vec<MemberDef>,
}

impl Default for GroupDef {
    fn default() -> Self {
        Self {
            profile: 0,
            weight: 1,
            cohesion_radius: 2.0,
            jitter: 1.0,
            members: Vec::new(),
        }
    }
}

/// Creature table of one biome (or the fallback).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureRuleDef {
    /// Biome name; ignored for the fallback rule.
    pub biome: String,
    /// Probability that a candidate cell spawns a group.
    pub density: f64,
    /// Weighted groups.
    pub groups: Vec<GroupDef>,
}

/// Creature group planner settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureConfig {
    /// Salt separating creature randomness from other planners.
    pub salt: u64,
    /// Candidate grid step, in cells.
    pub step: u32,
    /// Minimum distance between group anchors, in cells.
    pub min_group_distance: f32,
    /// Reservation bits that veto anchors and members.
    pub avoid_mask: ReservationMask,
    /// Per-biome tables.
    pub rules: Vec<CreatureRuleDef>,
    /// Table for biomes without an entry.
    pub fallback: Option<CreatureRuleDef>,
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            salt: 0xC8_EA,
            step: 16,
            min_group_distance: 20.0,
            avoid_mask: ReservationMask::CREATURES | ReservationMask::CAMPS,
            rules: default_creature_rules(),
            fallback: Some(CreatureRuleDef {
                biome: String::new(),
                density: 0.05,
                groups: vec![GroupDef {
                    profile: 300,
                    weight: 1,
                    cohesion_radius: 1.5,
                    jitter: 0.5,
                    members: vec![MemberDef { profile: 301, count: [1, 2] }],
                }],
            }),
        }
    }
}

// =============================================================================
// STREAMING
// =============================================================================

/// Radii of one streaming controller, in cells.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Base view radius.
    pub base_radius: f32,
    /// Added to the base radius to get the load circle.
    pub load_padding: f32,
    /// Added to the base radius to get the keep circle (≥ `load_padding`).
    pub keep_padding: f32,
    /// Own chunk size; the world chunk size when absent.
    pub chunk_size: Option<u32>,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            base_radius: 96.0,
            load_padding: 0.0,
            keep_padding: 32.0,
            chunk_size: None,
        }
    }
}

/// Settings of the four streaming controllers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Biome tiles.
    pub tiles: StreamerConfig,
    /// Static objects.
    pub objects: StreamerConfig,
    /// Camps.
    pub camps: StreamerConfig,
    /// Creature groups.
    pub creatures: StreamerConfig,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            tiles: StreamerConfig {
                base_radius: 128.0,
                ..StreamerConfig::default()
            },
            objects: StreamerConfig::default(),
            camps: StreamerConfig {
                base_radius: 96.0,
                load_padding: 16.0,
                keep_padding: 48.0,
                chunk_size: None,
            },
            creatures: StreamerConfig {
                base_radius: 64.0,
                load_padding: 0.0,
                keep_padding: 24.0,
                chunk_size: None,
            },
        }
    }
}

impl StreamingConfig {
    /// The four controllers with their names.
    #[must_use]
    pub fn named(&self) -> [(&'static str, &StreamerConfig); 4] {
        [
            ("tiles", &self.tiles),
            ("objects", &self.objects),
            ("camps", &self.camps),
            ("creatures", &self.creatures),
        ]
    }
}

// =============================================================================
// DEFAULT TABLES
// =============================================================================

fn biome(name: &str, color: [u8; 3]) -> BiomeDef {
    BiomeDef {
        name: name.into(),
        color,
    }
}

fn chance(biome: &str, min: f64, max: f64) -> BiomeChanceDef {
    BiomeChanceDef {
        biome: biome.into(),
        min,
        max,
    }
}

fn default_biomes() -> Vec<BiomeDef> {
    vec![
        biome("tundra", [200, 210, 220]),
        biome("taiga", [60, 100, 80]),
        biome("forest", [40, 120, 50]),
        biome("plains", [120, 180, 80]),
        biome("steppe", [170, 170, 100]),
        biome("desert", [220, 200, 130]),
        biome("marsh", [80, 110, 90]),
    ]
}

fn default_zones() -> Vec<ClimateZoneDef> {
    vec![
        ClimateZoneDef {
            name: "polar".into(),
            start_percent: 0.0,
            end_percent: 20.0,
            default_biome: "tundra".into(),
            biome_chances: vec![chance("tundra", 0.0, 0.7), chance("taiga", 0.7, 1.0)],
        },
        ClimateZoneDef {
            name: "temperate".into(),
            start_percent: 20.0,
            end_percent: 70.0,
            default_biome: "plains".into(),
            biome_chances: vec![
                chance("forest", 0.0, 0.4),
                chance("plains", 0.4, 0.8),
                chance("marsh", 0.8, 1.0),
            ],
        },
        ClimateZoneDef {
            name: "arid".into(),
            start_percent: 70.0,
            end_percent: 100.0,
            default_biome: "desert".into(),
            biome_chances: vec![chance("steppe", 0.0, 0.45), chance("desert", 0.45, 1.0)],
        },
    ]
}

fn default_placement() -> Vec<PlacementRuleDef> {
    vec![
        PlacementRuleDef {
            biome: "forest".into(),
            kind: 1,
            target_per_chunk: 60,
            mode: PlacementMode::Clustered,
            priority: 10,
            footprint: [1, 1],
            variants: 3,
            ..PlacementRuleDef::default()
        },
        PlacementRuleDef {
            biome: "plains".into(),
            kind: 2,
            target_per_chunk: 10,
            mode: PlacementMode::Uniform,
            footprint: [1, 1],
            variants: 2,
            ..PlacementRuleDef::default()
        },
        PlacementRuleDef {
            biome: "plains".into(),
            kind: 3,
            target_per_chunk: 24,
            mode: PlacementMode::BlueNoise,
            min_distance_same_type: 9.0,
            noise: Some(NoiseGateDef {
                scale: 0.08,
                threshold: 0.35,
            }),
            ..PlacementRuleDef::default()
        },
        PlacementRuleDef {
            biome: "desert".into(),
            kind: 4,
            target_per_chunk: 6,
            mode: PlacementMode::Uniform,
            footprint: [2, 2],
            avoid_radius: Some(6.0),
            ..PlacementRuleDef::default()
        },
        PlacementRuleDef {
            biome: "marsh".into(),
            kind: 5,
            target_per_chunk: 12,
            mode: PlacementMode::Uniform,
            requires_nearby_biome: Some(NearbyBiomeDef {
                biome: "forest".into(),
                radius: 6,
            }),
            ..PlacementRuleDef::default()
        },
    ]
}

fn default_creature_rules() -> Vec<CreatureRuleDef> {
    vec![
        CreatureRuleDef {
            biome: "forest".into(),
            density: 0.35,
            groups: vec![
                GroupDef {
                    profile: 310,
                    weight: 3,
                    cohesion_radius: 2.5,
                    jitter: 1.0,
                    members: vec![MemberDef { profile: 311, count: [2, 4] }],
                },
                GroupDef {
                    profile: 320,
                    weight: 1,
                    cohesion_radius: 3.0,
                    jitter: 1.0,
                    members: vec![
                        MemberDef { profile: 321, count: [1, 1] },
                        MemberDef { profile: 322, count: [2, 3] },
                    ],
                },
            ],
        },
        CreatureRuleDef {
            biome: "plains".into(),
            density: 0.25,
            groups: vec![GroupDef {
                profile: 330,
                weight: 1,
                cohesion_radius: 3.0,
                jitter: 1.5,
                members: vec![MemberDef { profile: 331, count: [3, 6] }],
            }],
        },
    ]
}
