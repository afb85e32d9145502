//! Defensive type matchups.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PokemonType {
    Normal,
    Fire,
    Water,
    Grass,
    Electric,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown type '{0}'")]
pub struct UnknownType(pub String);

impl FromStr for PokemonType {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowercase = s.to_lowercase();
        PokemonType::ALL
            .into_iter()
            .find(|ty| ty.name() == lowercase)
            .ok_or_else(|| UnknownType(s.to_string()))
    }
}

impl fmt::Display for PokemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attack types a defending type takes extra, reduced or no damage from.
struct Matchups {
    weaknesses: &'static [PokemonType],
    resistances: &'static [PokemonType],
    immunities: &'static [PokemonType],
}

impl PokemonType {
    pub const ALL: [PokemonType; 18] = [
        PokemonType::Normal,
        PokemonType::Fire,
        PokemonType::Water,
        PokemonType::Grass,
        PokemonType::Electric,
        PokemonType::Ice,
        PokemonType::Fighting,
        PokemonType::Poison,
        PokemonType::Ground,
        PokemonType::Flying,
        PokemonType::Psychic,
        PokemonType::Bug,
        PokemonType::Rock,
        PokemonType::Ghost,
        PokemonType::Dragon,
        PokemonType::Dark,
        PokemonType::Steel,
        PokemonType::Fairy,
    ];

    /// The lowercase name the catalog uses.
    pub fn name(self) -> &'static str {
        match self {
            PokemonType::Normal => "normal",
            PokemonType::Fire => "fire",
            PokemonType::Water => "water",
            PokemonType::Grass => "grass",
            PokemonType::Electric => "electric",
            PokemonType::Ice => "ice",
            PokemonType::Fighting => "fighting",
            PokemonType::Poison => "poison",
            PokemonType::Ground => "ground",
            PokemonType::Flying => "flying",
            PokemonType::Psychic => "psychic",
            PokemonType::Bug => "bug",
            PokemonType::Rock => "rock",
            PokemonType::Ghost => "ghost",
            PokemonType::Dragon => "dragon",
            PokemonType::Dark => "dark",
            PokemonType::Steel => "steel",
            PokemonType::Fairy => "fairy",
        }
    }

    fn matchups(self) -> Matchups {
        use PokemonType::*;
        match self {
            Normal => Matchups {
                weaknesses: &[Fighting],
                resistances: &[],
                immunities: &[Ghost],
            },
            Fire => Matchups {
                weaknesses: &[Water, Ground, Rock],
                resistances: &[Fire, Grass, Ice, Bug, Steel, Fairy],
                immunities: &[],
            },
            Water => Matchups {
                weaknesses: &[Electric, Grass],
                resistances: &[Fire, Water, Ice, Steel],
                immunities: &[],
            },
            Grass => Matchups {
                weaknesses: &[Fire, Ice, Poison, Flying, Bug],
                resistances: &[Water, Electric, Grass, Ground],
                immunities: &[],
            },
            Electric => Matchups {
                weaknesses: &[Ground],
                resistances: &[Electric, Flying, Steel],
                immunities: &[],
            },
            Ice => Matchups {
                weaknesses: &[Fire, Fighting, Rock, Steel],
                resistances: &[Ice],
                immunities: &[],
            },
            Fighting => Matchups {
                weaknesses: &[Flying, Psychic, Fairy],
                resistances: &[Bug, Rock, Dark],
                immunities: &[],
            },
            Poison => Matchups {
                weaknesses: &[Ground, Psychic],
                resistances: &[Grass, Fighting, Poison, Bug, Fairy],
                immunities: &[],
            },
            Ground => Matchups {
                weaknesses: &[Water, Grass, Ice],
                resistances: &[Poison, Rock],
                immunities: &[Electric],
            },
            Flying => Matchups {
                weaknesses: &[Electric, Ice, Rock],
                resistances: &[Grass, Fighting, Bug],
                immunities: &[Ground],
            },
            Psychic => Matchups {
                weaknesses: &[Bug, Ghost, Dark],
                resistances: &[Fighting, Psychic],
                immunities: &[],
            },
            Bug => Matchups {
                weaknesses: &[Fire, Flying, Rock],
                resistances: &[Grass, Fighting, Ground],
                immunities: &[],
            },
            Rock => Matchups {
                weaknesses: &[Water, Grass, Fighting, Ground, Steel],
                resistances: &[Normal, Fire, Poison, Flying],
                immunities: &[],
            },
            Ghost => Matchups {
                weaknesses: &[Ghost, Dark],
                resistances: &[Poison, Bug],
                immunities: &[Normal, Fighting],
            },
            Dragon => Matchups {
                weaknesses: &[Ice, Dragon, Fairy],
                resistances: &[Fire, Water, Electric, Grass],
                immunities: &[],
            },
            Dark => Matchups {
                weaknesses: &[Fighting, Bug, Fairy],
                resistances: &[Ghost, Dark],
                immunities: &[Psychic],
            },
            Steel => Matchups {
                weaknesses: &[Fire, Fighting, Ground],
                resistances: &[
                    Normal, Grass, Ice, Flying, Psychic, Bug, Rock, Dragon, Steel, Fairy,
                ],
                immunities: &[Poison],
            },
            Fairy => Matchups {
                weaknesses: &[Poison, Steel],
                resistances: &[Fighting, Bug, Dark],
                immunities: &[Dragon],
            },
        }
    }
}

/// Damage multiplier of one attacking type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Multiplier {
    pub attacking: PokemonType,
    pub multiplier: f32,
}

/// How a combination of defending types fares against every attacking type.
///
/// Neutral matchups are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeEffectiveness {
    /// ×2 or ×4, strongest first.
    pub weaknesses: Vec<Multiplier>,
    /// ×0.5 or ×0.25, strongest resistance first.
    pub resistances: Vec<Multiplier>,
    pub immunities: Vec<PokemonType>,
}

impl TypeEffectiveness {
    /// Combine the matchups of `types`, applied in order.
    pub fn for_types(types: &[PokemonType]) -> Self {
        let mut multipliers = [1.0_f32; PokemonType::ALL.len()];

        for defending in types {
            let matchups = defending.matchups();
            for attacking in matchups.weaknesses {
                multipliers[*attacking as usize] *= 2.0;
            }
            for attacking in matchups.resistances {
                multipliers[*attacking as usize] *= 0.5;
            }
            for attacking in matchups.immunities {
                multipliers[*attacking as usize] = 0.0;
            }
        }

        let mut effectiveness = Self::default();
        for (attacking, multiplier) in PokemonType::ALL.into_iter().zip(multipliers) {
            if multiplier == 0.0 {
                effectiveness.immunities.push(attacking);
            } else if multiplier > 1.0 {
                effectiveness.weaknesses.push(Multiplier {
                    attacking,
                    multiplier,
                });
            } else if multiplier < 1.0 {
                effectiveness.resistances.push(Multiplier {
                    attacking,
                    multiplier,
                });
            }
        }

        // stable, ties keep chart order
        effectiveness
            .weaknesses
            .sort_by(|a, b| b.multiplier.total_cmp(&a.multiplier));
        effectiveness
            .resistances
            .sort_by(|a, b| a.multiplier.total_cmp(&b.multiplier));

        effectiveness
    }

    /// Like [`TypeEffectiveness::for_types`] for type names as the catalog
    /// reports them, names that are not a known type are ignored.
    pub fn for_type_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let types = names
            .into_iter()
            .filter_map(|name| name.parse().ok())
            .collect::<Vec<PokemonType>>();
        Self::for_types(&types)
    }
}
