//! Light scenario and render target payloads
//!
//! The scenario layout was reconstructed from captured files and is the
//! most revision-sensitive payload after meshes. Hash blocks and bitfields
//! whose meaning is still unclear are stored and re-emitted verbatim so a
//! load/serialize cycle preserves them exactly.

use crate::error::BundleError;
use crate::io::{
    read_array, read_bool, read_bytes, read_i32, read_string_7bit, read_u8, read_u32, write_bool,
    write_bytes, write_i32, write_string_7bit, write_u8, write_u32, SliceReader, VecWriter,
};
use crate::version::Version;

/// Shader hash pinned to one target platform (from 1.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformHash {
    /// Platform selector
    pub platform: u8,
    /// Compiled shader digest
    pub digest: [u8; 32],
}

/// One vertex shader entry of a light scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderStageEntry {
    /// Stage selector byte (from 1.2)
    pub stage: u8,
    /// Vertex shader path
    pub path: String,
    /// Per-platform digests (from 1.6)
    pub platform_hashes: Vec<PlatformHash>,
    /// Fixed digest pair carried only by 1.5 files
    pub legacy_digests: [[u8; 32]; 2],
    /// Instanced-rendering shader path, present when the owning scenario
    /// has instanced data
    pub instanced_path: String,
}

/// One lighting scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightScenario {
    /// Scenario name
    pub name: String,
    /// Scenario revision stamp
    pub revision: u32,
    /// Scenario carries instanced-rendering shader paths (from 1.4).
    /// Stored as read rather than re-derived, so round-trips are exact;
    /// the original selection condition is provisional.
    pub instanced: bool,
    /// Vertex shader entries (exactly one before 1.2)
    pub shaders: Vec<ShaderStageEntry>,
    /// Raw option bits (from 1.3), preserved verbatim
    pub bitfield: i32,
    /// Geometry/pixel shader path
    pub geometry_pixel_shader: String,
    /// Extra instanced pixel shader path (1.5+ when instanced)
    pub instanced_pixel_shader: String,
}

/// Light scenario set record (also used by the debug variant tag).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightScenarioSet {
    /// Scenario set is inlined rather than referenced (from 1.1)
    pub inline: bool,
    /// Scenarios in priority order
    pub scenarios: Vec<LightScenario>,
}

impl LightScenarioSet {
    pub(crate) fn read(c: &mut SliceReader<'_>, v: Version) -> Result<Self, BundleError> {
        let inline = if v.at_least(1, 1) {
            read_bool(c)?
        } else {
            false
        };

        let count = read_u8(c)? as usize;
        let mut scenarios = Vec::with_capacity(count);
        for _ in 0..count {
            scenarios.push(Self::read_scenario(c, v)?);
        }

        Ok(Self { inline, scenarios })
    }

    fn read_scenario(c: &mut SliceReader<'_>, v: Version) -> Result<LightScenario, BundleError> {
        let name = read_string_7bit(c)?;
        let revision = read_u32(c)?;

        let instanced = if v.at_least(1, 4) {
            read_bool(c)?
        } else {
            false
        };

        let shader_count = if v.at_least(1, 2) {
            read_u32(c)? as usize
        } else {
            1
        };

        let mut shaders = Vec::with_capacity(shader_count.min(crate::io::remaining(c)));
        for _ in 0..shader_count {
            let stage = if v.at_least(1, 2) { read_u8(c)? } else { 0 };
            let path = read_string_7bit(c)?;

            let mut platform_hashes = Vec::new();
            let mut legacy_digests = [[0u8; 32]; 2];
            if v.at_least(1, 6) {
                let hash_count = read_u8(c)? as usize;
                platform_hashes.reserve(hash_count);
                for _ in 0..hash_count {
                    platform_hashes.push(PlatformHash {
                        platform: read_u8(c)?,
                        digest: read_array(c)?,
                    });
                }
            } else if v.at_least(1, 5) {
                legacy_digests[0] = read_array(c)?;
                legacy_digests[1] = read_array(c)?;
            }

            let instanced_path = if instanced {
                read_string_7bit(c)?
            } else {
                String::new()
            };

            shaders.push(ShaderStageEntry {
                stage,
                path,
                platform_hashes,
                legacy_digests,
                instanced_path,
            });
        }

        let bitfield = if v.at_least(1, 3) { read_i32(c)? } else { 0 };
        let geometry_pixel_shader = read_string_7bit(c)?;

        let instanced_pixel_shader = if v.at_least(1, 5) && instanced {
            read_string_7bit(c)?
        } else {
            String::new()
        };

        Ok(LightScenario {
            name,
            revision,
            instanced,
            shaders,
            bitfield,
            geometry_pixel_shader,
            instanced_pixel_shader,
        })
    }

    pub(crate) fn write(&self, w: &mut VecWriter, v: Version) -> Result<(), BundleError> {
        if v.at_least(1, 1) {
            write_bool(w, self.inline);
        }

        write_u8(w, self.scenarios.len() as u8);
        for scenario in &self.scenarios {
            Self::write_scenario(w, scenario, v)?;
        }

        Ok(())
    }

    fn write_scenario(
        w: &mut VecWriter,
        scenario: &LightScenario,
        v: Version,
    ) -> Result<(), BundleError> {
        write_string_7bit(w, &scenario.name);
        write_u32(w, scenario.revision);

        // The flag and the multi-shader count only exist on the wire from
        // their own gate versions; older targets can express neither, so the
        // writer collapses to what the matching reader will consume.
        let instanced = v.at_least(1, 4) && scenario.instanced;
        if v.at_least(1, 4) {
            write_bool(w, scenario.instanced);
        }
        let shader_limit = if v.at_least(1, 2) {
            write_u32(w, scenario.shaders.len() as u32);
            scenario.shaders.len()
        } else {
            1
        };

        for shader in scenario.shaders.iter().take(shader_limit) {
            if v.at_least(1, 2) {
                write_u8(w, shader.stage);
            }
            write_string_7bit(w, &shader.path);

            if v.at_least(1, 6) {
                write_u8(w, shader.platform_hashes.len() as u8);
                for hash in &shader.platform_hashes {
                    write_u8(w, hash.platform);
                    write_bytes(w, &hash.digest);
                }
            } else if v.at_least(1, 5) {
                write_bytes(w, &shader.legacy_digests[0]);
                write_bytes(w, &shader.legacy_digests[1]);
            }

            if instanced {
                write_string_7bit(w, &shader.instanced_path);
            }
        }

        if v.at_least(1, 3) {
            write_i32(w, scenario.bitfield);
        }
        write_string_7bit(w, &scenario.geometry_pixel_shader);

        if v.at_least(1, 5) && instanced {
            write_string_7bit(w, &scenario.instanced_pixel_shader);
        }

        Ok(())
    }
}

/// Render target description record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderTarget {
    /// Target is inlined rather than referenced (from 1.1)
    pub inline: bool,
    /// Undecoded length-prefixed tail, preserved verbatim
    pub tail: Vec<u8>,
}

impl RenderTarget {
    pub(crate) fn read(c: &mut SliceReader<'_>, v: Version) -> Result<Self, BundleError> {
        let inline = if v.at_least(1, 1) {
            read_bool(c)?
        } else {
            false
        };
        let len = read_u8(c)? as usize;
        let tail = read_bytes(c, len)?;
        Ok(Self { inline, tail })
    }

    pub(crate) fn write(&self, w: &mut VecWriter, v: Version) -> Result<(), BundleError> {
        if v.at_least(1, 1) {
            write_bool(w, self.inline);
        }
        write_u8(w, self.tail.len() as u8);
        write_bytes(w, &self.tail);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> LightScenarioSet {
        LightScenarioSet {
            inline: true,
            scenarios: vec![LightScenario {
                name: "day_clear".to_string(),
                revision: 12,
                instanced: true,
                shaders: vec![
                    ShaderStageEntry {
                        stage: 0,
                        path: "shaders/scene_vs".to_string(),
                        platform_hashes: vec![
                            PlatformHash {
                                platform: 0,
                                digest: [0xA0; 32],
                            },
                            PlatformHash {
                                platform: 2,
                                digest: [0xB1; 32],
                            },
                        ],
                        legacy_digests: [[0; 32]; 2],
                        instanced_path: "shaders/scene_vs_inst".to_string(),
                    },
                    ShaderStageEntry {
                        stage: 1,
                        path: "shaders/depth_vs".to_string(),
                        platform_hashes: vec![],
                        legacy_digests: [[0; 32]; 2],
                        instanced_path: "shaders/depth_vs_inst".to_string(),
                    },
                ],
                bitfield: 0x55,
                geometry_pixel_shader: "shaders/scene_ps".to_string(),
                instanced_pixel_shader: "shaders/scene_ps_inst".to_string(),
            }],
        }
    }

    fn roundtrip(set: &LightScenarioSet, v: Version) -> LightScenarioSet {
        let mut w = VecWriter::new(Vec::new());
        set.write(&mut w, v).unwrap();
        let bytes = w.into_inner();
        let mut c = SliceReader::new(&bytes);
        let back = LightScenarioSet::read(&mut c, v).unwrap();
        assert_eq!(crate::io::remaining(&c), 0, "trailing bytes at v{v}");
        back
    }

    #[test]
    fn test_roundtrip_1_6_keeps_platform_hashes() {
        let set = sample_set();
        assert_eq!(roundtrip(&set, Version::new(1, 6)), set);
    }

    #[test]
    fn test_roundtrip_1_5_keeps_legacy_digests() {
        let mut set = sample_set();
        for shader in &mut set.scenarios[0].shaders {
            shader.platform_hashes.clear();
            shader.legacy_digests = [[0x77; 32], [0x88; 32]];
        }
        assert_eq!(roundtrip(&set, Version::new(1, 5)), set);
    }

    #[test]
    fn test_old_versions_drop_gated_fields() {
        let set = sample_set();
        let back = roundtrip(&set, Version::new(1, 1));
        let scenario = &back.scenarios[0];
        // Pre-1.4 there is no instanced flag on the wire and pre-1.2 no
        // multi-shader count, so the list collapses to its first entry.
        assert!(!scenario.instanced);
        assert_eq!(scenario.bitfield, 0);
        assert_eq!(scenario.name, "day_clear");
        assert_eq!(scenario.shaders.len(), 1);
        assert_eq!(scenario.shaders[0].path, "shaders/scene_vs");
        assert!(scenario.shaders[0].instanced_path.is_empty());
        assert_eq!(scenario.geometry_pixel_shader, "shaders/scene_ps");
        assert!(back.inline);
    }

    #[test]
    fn test_non_instanced_scenario_has_no_instanced_paths() {
        let mut set = sample_set();
        set.scenarios[0].instanced = false;
        for shader in &mut set.scenarios[0].shaders {
            shader.instanced_path.clear();
        }
        set.scenarios[0].instanced_pixel_shader.clear();
        assert_eq!(roundtrip(&set, Version::new(1, 6)), set);
    }

    #[test]
    fn test_render_target_roundtrip() {
        let target = RenderTarget {
            inline: true,
            tail: vec![1, 2, 3, 4, 5],
        };
        let mut w = VecWriter::new(Vec::new());
        target.write(&mut w, Version::new(1, 1)).unwrap();
        let bytes = w.into_inner();

        let mut c = SliceReader::new(&bytes);
        let back = RenderTarget::read(&mut c, Version::new(1, 1)).unwrap();
        assert_eq!(back, target);

        // Pre-1.1 drops the inline flag byte
        let mut w = VecWriter::new(Vec::new());
        target.write(&mut w, Version::new(1, 0)).unwrap();
        assert_eq!(w.into_inner().len(), 1 + 5);
    }
}
