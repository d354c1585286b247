use crate::pathintegrator::{LightStrategy, PathIntegrator};
use accel::{BvhConfig, SplitMethod};
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("unrecognized key {0}")]
    UnknownKey(String),
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

/// Everything an entry point hands to the renderer besides the scene itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub use_multi_thread: bool,
    pub max_depth: u32,
    pub rr_threshold: f32,
    pub strategy: LightStrategy,
    pub split_method: SplitMethod,
    pub max_prims_in_node: usize,
    pub spp: u32,
    pub tile_size: u32,
    pub seed: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        let integrator = PathIntegrator::default();
        let bvh_config = BvhConfig::default();
        Self {
            use_multi_thread: true,
            max_depth: integrator.max_depth(),
            rr_threshold: integrator.rr_threshold(),
            strategy: integrator.strategy(),
            split_method: bvh_config.split_method,
            max_prims_in_node: bvh_config.max_prims_in_node,
            spp: 16,
            tile_size: 16,
            seed: 0,
        }
    }
}

impl RenderOptions {
    pub fn message() -> &'static str {
        r#"
        --use_multi_thread | --use_single_thread
        --max_depth <n>
        --rr_threshold <x>
        --strategy bxdf|mis
        --split_method sah|middle|equal_counts
        --max_prims_in_node <n>
        --spp <n>
        --tile_size <n>
        --seed <n>
        "#
    }

    pub fn integrator(&self) -> PathIntegrator {
        PathIntegrator::default()
            .with_max_depth(self.max_depth)
            .with_rr_threshold(self.rr_threshold)
            .with_strategy(self.strategy)
    }

    pub fn bvh_config(&self) -> BvhConfig {
        BvhConfig::default()
            .with_split_method(self.split_method)
            .with_max_prims_in_node(self.max_prims_in_node)
    }
}

fn parse_value<T: FromStr>(key: &str, value: Option<String>) -> Result<T, OptionsError> {
    let value = value.ok_or_else(|| OptionsError::MissingValue(key.to_string()))?;
    value.parse().map_err(|_| OptionsError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

fn parse_choice<T: Copy>(
    key: &str, value: Option<String>, choices: &[(&str, T)],
) -> Result<T, OptionsError> {
    let value = value.ok_or_else(|| OptionsError::MissingValue(key.to_string()))?;
    choices
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, choice)| *choice)
        .ok_or(OptionsError::InvalidValue {
            key: key.to_string(),
            value,
        })
}

/// Parses `--key value` pairs (and bare `--flag`s). `args[0]` is the program name and is skipped.
pub fn parse_args(args: Vec<String>) -> Result<RenderOptions, OptionsError> {
    let mut pairs: Vec<(String, Option<String>)> = vec![];
    let mut args = args.into_iter().rev().collect::<Vec<_>>();
    args.pop(); // Removes args[0]

    while let Some(key) = args.pop() {
        if !key.starts_with("--") {
            return Err(OptionsError::UnknownKey(key));
        }
        let value = match args.last() {
            Some(value) if !value.starts_with("--") => args.pop(),
            _ => None,
        };
        pairs.push((key, value));
    }
    // Pairs apply in argument order, so a later key overrides an earlier one.
    let mut options = RenderOptions::default();
    for (k, v) in pairs.into_iter() {
        match k.as_str() {
            "--use_multi_thread" => options.use_multi_thread = true,
            "--use_single_thread" => options.use_multi_thread = false,
            "--max_depth" => options.max_depth = parse_value(&k, v)?,
            "--rr_threshold" => options.rr_threshold = parse_value(&k, v)?,
            "--strategy" => {
                options.strategy = parse_choice(
                    &k,
                    v,
                    &[("bxdf", LightStrategy::BxdfOnly), ("mis", LightStrategy::Mis)],
                )?
            }
            "--split_method" => {
                options.split_method = parse_choice(
                    &k,
                    v,
                    &[
                        ("sah", SplitMethod::Sah),
                        ("middle", SplitMethod::Middle),
                        ("equal_counts", SplitMethod::EqualCounts),
                    ],
                )?
            }
            "--max_prims_in_node" => options.max_prims_in_node = parse_value(&k, v)?,
            "--spp" => options.spp = parse_value(&k, v)?,
            "--tile_size" => options.tile_size = parse_value(&k, v)?,
            "--seed" => options.seed = parse_value(&k, v)?,
            _ => return Err(OptionsError::UnknownKey(k)),
        }
    }
    Ok(options)
}

#[cfg(test)]
mod test {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        std::iter::once("pbrs")
            .chain(line.split_whitespace())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parses_every_key() {
        let options = parse_args(args(
            "--use_single_thread --max_depth 9 --rr_threshold 0.5 --strategy mis \
             --split_method middle --max_prims_in_node 2 --spp 64 --tile_size 8 --seed 42",
        ))
        .unwrap();
        assert_eq!(
            options,
            RenderOptions {
                use_multi_thread: false,
                max_depth: 9,
                rr_threshold: 0.5,
                strategy: LightStrategy::Mis,
                split_method: SplitMethod::Middle,
                max_prims_in_node: 2,
                spp: 64,
                tile_size: 8,
                seed: 42,
            }
        );
        assert_eq!(options.integrator().max_depth(), 9);
        assert_eq!(options.bvh_config().max_prims_in_node, 2);
    }

    #[test]
    fn no_arguments_gives_defaults() {
        assert_eq!(parse_args(args("")).unwrap(), RenderOptions::default());
        assert_eq!(parse_args(vec![]).unwrap(), RenderOptions::default());
    }

    #[test]
    fn later_flags_override_earlier_ones() {
        let options = parse_args(args("--use_single_thread --use_multi_thread")).unwrap();
        assert!(options.use_multi_thread);
        let options = parse_args(args("--use_multi_thread --use_single_thread")).unwrap();
        assert!(!options.use_multi_thread);

        let options = parse_args(args("--spp 4 --strategy mis --spp 8 --strategy bxdf")).unwrap();
        assert_eq!(options.spp, 8);
        assert_eq!(options.strategy, LightStrategy::BxdfOnly);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            parse_args(args("--frobnicate")),
            Err(OptionsError::UnknownKey("--frobnicate".into()))
        );
        assert_eq!(
            parse_args(args("stray")),
            Err(OptionsError::UnknownKey("stray".into()))
        );
        assert_eq!(
            parse_args(args("--spp --seed 3")),
            Err(OptionsError::MissingValue("--spp".into()))
        );
        assert_eq!(
            parse_args(args("--max_depth five")),
            Err(OptionsError::InvalidValue {
                key: "--max_depth".into(),
                value: "five".into()
            })
        );
        assert!(matches!(
            parse_args(args("--strategy light")),
            Err(OptionsError::InvalidValue { .. })
        ));
    }
}
