use once_cell::sync::Lazy;
use rand::Rng;

use crate::config::MAX_ATTEMPTS;
use crate::error::{Error, Result};
use crate::exclusion::ExclusionList;
use crate::model::{Captures, Category, Node};

/// Alphabet behind `.`: digits and ASCII letters only, keeping generated
/// ids printable and unambiguous.
static ANY_ALPHABET: Lazy<Vec<char>> =
    Lazy::new(|| ('0'..='9').chain('a'..='z').chain('A'..='Z').collect());

const DIGITS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
const SPACES: [char; 2] = [' ', '\t'];

pub trait Generate {
    fn generate(&self, rng: &mut impl Rng, captures: &mut Captures) -> Result<String>;
}

impl Generate for [Node] {
    fn generate(&self, rng: &mut impl Rng, captures: &mut Captures) -> Result<String> {
        self.iter()
            .map(|node| node.generate(rng, captures))
            .collect::<Result<Vec<_>>>()
            .map(|parts| parts.join(""))
    }
}

impl Generate for Category {
    fn generate(&self, rng: &mut impl Rng, _captures: &mut Captures) -> Result<String> {
        match self {
            Self::Digit => {
                let i = rng.gen_range(0..DIGITS.len());
                Ok(DIGITS[i].to_string())
            }
            Self::Space => {
                let i = rng.gen_range(0..SPACES.len());
                Ok(SPACES[i].to_string())
            }
            other => Err(Error::UnsupportedCategory(*other)),
        }
    }
}

impl Generate for Node {
    fn generate(&self, rng: &mut impl Rng, captures: &mut Captures) -> Result<String> {
        match self {
            Self::Literal(c) => Ok(c.to_string()),
            Self::CharIn(elements) => elements.generate(rng, captures),
            Self::Range(min, max) => {
                if min > max {
                    return Err(Error::Pattern(format!("bad character range {min}-{max}")));
                }
                Ok(rng.gen_range(*min..=*max).to_string())
            }
            Self::BoundedRepeat { count, body } => (0..*count)
                .map(|_| body.generate(rng, captures))
                .collect::<Result<Vec<_>>>()
                .map(|parts| parts.join("")),
            Self::Subpattern { index, body } => {
                let value = match body.as_slice() {
                    [branch @ Self::Branch(_)] => branch.generate(rng, captures)?,
                    [Self::CharIn(elements)] => {
                        // Check before drawing so a negated or empty class
                        // fails for every seed, not just the seeds that
                        // happen to land on the bad element.
                        if elements.first() == Some(&Self::Negated) {
                            return Err(Error::UnsupportedConstruct("negated character class"));
                        }
                        if elements.is_empty() {
                            return Err(Error::UnsupportedConstruct("empty character class"));
                        }
                        let i = rng.gen_range(0..elements.len());
                        elements[i].generate(rng, captures)?
                    }
                    _ => {
                        return Err(Error::UnsupportedConstruct(
                            "group body must be a single alternation or character class",
                        ))
                    }
                };
                captures.capture(*index, value.clone())?;
                Ok(value)
            }
            Self::Branch(branches) => {
                let i = rng.gen_range(0..branches.len());
                branches[i].generate(rng, captures)
            }
            Self::BackReference(index) => captures.resolve(*index).map(str::to_string),
            Self::Category(category) => category.generate(rng, captures),
            Self::Wildcard => {
                let i = rng.gen_range(0..ANY_ALPHABET.len());
                Ok(ANY_ALPHABET[i].to_string())
            }
            Self::Negated => Err(Error::UnsupportedConstruct("negated character class")),
            Self::Unsupported(what) => Err(Error::UnsupportedConstruct(*what)),
        }
    }
}

/// One full generation pass over `nodes` with a fresh capture table.
pub fn instance(nodes: &[Node], rng: &mut impl Rng) -> Result<String> {
    let mut captures = Captures::new();
    nodes.generate(rng, &mut captures)
}

/// Generates until the result is not in `exclusions`, giving up after
/// [`MAX_ATTEMPTS`] full passes.
pub fn unique_instance(
    nodes: &[Node],
    exclusions: &ExclusionList,
    rng: &mut impl Rng,
) -> Result<String> {
    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = instance(nodes, rng)?;
        if !exclusions.contains(&candidate) {
            return Ok(candidate);
        }
        log::debug!("attempt {attempt}: {candidate:?} is already taken");
    }
    Err(Error::Exhausted {
        attempts: MAX_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use regex::Regex;

    use super::*;
    use crate::parser;

    fn generate(pattern: &str, seed: u64) -> Result<String> {
        let nodes = parser::parse(pattern)?;
        let mut rng = StdRng::seed_from_u64(seed);
        instance(&nodes, &mut rng)
    }

    #[test]
    fn test_literals_come_out_verbatim() {
        assert_eq!(generate(r"AB_\$x", 0), Ok("AB_$x".to_string()));
    }

    #[test]
    fn test_range_stays_within_bounds() {
        for seed in 0..200 {
            let id = generate("[0-9]", seed).unwrap();
            assert_eq!(id.len(), 1);
            assert!(id.chars().all(|c| c.is_ascii_digit()), "got {id:?}");
        }
    }

    #[test]
    fn test_class_concatenates_elements() {
        // A bare class contributes every element, in order.
        assert_eq!(generate("[abc]", 5), Ok("abc".to_string()));
        let id = generate("[0-9a-f]", 7).unwrap();
        assert_eq!(id.len(), 2);
        assert!(id.chars().next().unwrap().is_ascii_digit());
        assert!(('a'..='f').contains(&id.chars().nth(1).unwrap()));
    }

    #[test]
    fn test_bounded_repeat_uses_minimum() {
        assert_eq!(generate("[0-9]{3,7}", 1).unwrap().len(), 3);
        assert_eq!(generate("x{4}", 1), Ok("xxxx".to_string()));
        assert_eq!(generate("x?", 1), Ok(String::new()));
    }

    #[test]
    fn test_end_to_end_shape() {
        let shape = Regex::new(r"^AB_[0-9]{3}$").unwrap();
        for seed in 0..50 {
            let id = generate("AB_[0-9]{3}", seed).unwrap();
            assert_eq!(id.len(), 6);
            assert!(shape.is_match(&id), "got {id:?}");
        }
    }

    #[test]
    fn test_branch_picks_one_alternative() {
        let shape = Regex::new(r"^(x|[0-9][a-z])$").unwrap();
        for seed in 0..50 {
            let id = generate("x|[0-9][a-z]", seed).unwrap();
            assert!(shape.is_match(&id), "got {id:?}");
        }
    }

    #[test]
    fn test_backreference_repeats_captured_group() {
        for seed in 0..50 {
            let id = generate(r"P_(a|[0-9][a-z])_\1", seed).unwrap();
            let rest = id.strip_prefix("P_").unwrap();
            let (first, second) = rest.split_once('_').unwrap();
            assert_eq!(first, second, "got {id:?}");
        }
    }

    #[test]
    fn test_subpattern_class_picks_single_element() {
        // Inside a group the class narrows to one element per pass.
        for seed in 0..50 {
            let id = generate("([0-9a-f])", seed).unwrap();
            assert_eq!(id.len(), 1);
            let c = id.chars().next().unwrap();
            assert!(c.is_ascii_digit() || ('a'..='f').contains(&c), "got {id:?}");
        }
    }

    #[test]
    fn test_forward_and_self_references_fail() {
        assert_eq!(generate(r"\1(a|b)", 0), Err(Error::Reference(1)));
        assert_eq!(generate(r"(a|b)\2", 0), Err(Error::Reference(2)));
    }

    #[test]
    fn test_negated_class_fails_for_every_seed() {
        for seed in 0..20 {
            assert_eq!(
                generate("[^ab]", seed),
                Err(Error::UnsupportedConstruct("negated character class"))
            );
            assert_eq!(
                generate("([^ab])", seed),
                Err(Error::UnsupportedConstruct("negated character class"))
            );
        }
    }

    #[test]
    fn test_unbounded_repeats_fail() {
        for pattern in ["ab*", "ab+", "a{2,}"] {
            assert!(matches!(
                generate(pattern, 0),
                Err(Error::UnsupportedConstruct(_))
            ));
        }
    }

    #[test]
    fn test_group_body_shapes_are_limited() {
        assert_eq!(
            generate("(abc)", 0),
            Err(Error::UnsupportedConstruct(
                "group body must be a single alternation or character class"
            ))
        );
        assert_eq!(
            generate("(a|b){2}", 0),
            Err(Error::UnsupportedConstruct("group captured out of order"))
        );
    }

    #[test]
    fn test_categories() {
        for seed in 0..30 {
            let id = generate(r"\d\s", seed).unwrap();
            let mut chars = id.chars();
            assert!(chars.next().unwrap().is_ascii_digit());
            assert!(matches!(chars.next(), Some(' ') | Some('\t')));
        }
        assert_eq!(
            generate(r"\w", 0),
            Err(Error::UnsupportedCategory(Category::Word))
        );
        assert_eq!(
            generate(r"\D", 0),
            Err(Error::UnsupportedCategory(Category::NotDigit))
        );
    }

    #[test]
    fn test_wildcard_sticks_to_its_alphabet() {
        for seed in 0..100 {
            let id = generate(".", seed).unwrap();
            assert_eq!(id.len(), 1);
            assert!(id.chars().next().unwrap().is_ascii_alphanumeric());
        }
    }

    #[test]
    fn test_same_seed_same_id() {
        assert_eq!(generate("[a-z]{8}", 99), generate("[a-z]{8}", 99));
    }

    #[test]
    fn test_unique_instance_skips_excluded_ids() {
        let nodes = parser::parse("ID_00[0-9]").unwrap();
        let exclusions = ExclusionList::from(vec!["ID_001".to_string()]);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let id = unique_instance(&nodes, &exclusions, &mut rng).unwrap();
            assert_ne!(id, "ID_001");
            assert!(id.starts_with("ID_00"));
        }
    }

    #[test]
    fn test_unique_instance_resets_captures_between_attempts() {
        let nodes = parser::parse(r"(a|b)_\1").unwrap();
        let exclusions = ExclusionList::from(vec!["a_a".to_string()]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            unique_instance(&nodes, &exclusions, &mut rng),
            Ok("b_b".to_string())
        );
    }

    #[test]
    fn test_exhausted_after_retry_budget() {
        // An all-literal pattern has a keyspace of one, so excluding the
        // only id burns the whole budget.
        let nodes = parser::parse("FIXED").unwrap();
        let exclusions = ExclusionList::from(vec!["FIXED".to_string()]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            unique_instance(&nodes, &exclusions, &mut rng),
            Err(Error::Exhausted {
                attempts: MAX_ATTEMPTS
            })
        );
        assert_eq!(MAX_ATTEMPTS, 20);
    }
}
