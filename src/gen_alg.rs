use crate::*;

/// Сторона генетического алгоритма, которой сеть сообщает допустимые границы генов
pub trait GenAlgBounds {
    fn adn_float_len(&self) -> usize;
    fn adn_int_len(&self) -> usize;
    fn set_bounds_adn_float(&mut self, gene: usize, bounds: (f32, f32));
    fn set_bounds_adn_int(&mut self, gene: usize, bounds: (i32, i32));
}

/// Вид сети для специализации мутаций в генетическом алгоритме
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenAlgNetType {
    /// Свободная топология: мутируют базы и связи
    Free {
        nb_input: usize,
        nb_max_hidden: usize,
        nb_output: usize,
    },
    /// Сверточная: связи фиксированы, мутируют только базы
    Convolution {
        nb_input: usize,
        nb_max_hidden: usize,
        nb_output: usize,
        nb_bases_conv: usize,
        nb_bases_cell_conv: usize,
    },
}

impl NeuraNet {
    /// Длина хромосомы вещественных генов (параметры баз)
    pub fn ga_adn_float_length(&self) -> usize {
        self.nb_max_bases() * NB_PARAM_BASE
    }

    /// Длина хромосомы целых генов (связи)
    pub fn ga_adn_int_length(&self) -> usize {
        self.nb_max_links() * NB_PARAM_LINK
    }

    /// Границы вещественных генов: все в [-1,1]
    pub fn float_bounds(&self) -> Vec<(f32, f32)> {
        vec![(-1.0, 1.0); self.ga_adn_float_length()]
    }

    /// Границы целых генов, по тройке на связь:
    /// база в [-1, nb_max_bases-1], 1-й конец - вход или скрытое, 2-й - скрытое или выход
    pub fn int_bounds(&self) -> Vec<(i32, i32)> {
        let nb_in_hid = (self.nb_input() + self.nb_max_hidden()) as i32;
        let triple = [
            (-1, self.nb_max_bases() as i32 - 1),
            (0, nb_in_hid - 1),
            (self.nb_input() as i32, self.max_id() as i32 - 1),
        ];
        triple.repeat(self.nb_max_links())
    }

    pub fn set_ga_bounds_bases<G: GenAlgBounds + ?Sized>(&self, ga: &mut G) -> NeuraNetResult<()> {
        if ga.adn_float_len() != self.ga_adn_float_length() {
            return Err(NeuraNetError::DimensionMismatch {
                what: "float chromosome",
                expected: self.ga_adn_float_length(),
                actual: ga.adn_float_len(),
            });
        }
        for (gene, bounds) in self.float_bounds().into_iter().enumerate() {
            ga.set_bounds_adn_float(gene, bounds);
        }
        Ok(())
    }

    pub fn set_ga_bounds_links<G: GenAlgBounds + ?Sized>(&self, ga: &mut G) -> NeuraNetResult<()> {
        if ga.adn_int_len() != self.ga_adn_int_length() {
            return Err(NeuraNetError::DimensionMismatch {
                what: "int chromosome",
                expected: self.ga_adn_int_length(),
                actual: ga.adn_int_len(),
            });
        }
        for (gene, bounds) in self.int_bounds().into_iter().enumerate() {
            ga.set_bounds_adn_int(gene, bounds);
        }
        Ok(())
    }

    pub fn ga_type(&self) -> GenAlgNetType {
        if self.nb_bases_conv() > 0 {
            GenAlgNetType::Convolution {
                nb_input: self.nb_input(),
                nb_max_hidden: self.nb_max_hidden(),
                nb_output: self.nb_output(),
                nb_bases_conv: self.nb_bases_conv(),
                nb_bases_cell_conv: self.nb_bases_cell_conv(),
            }
        } else {
            GenAlgNetType::Free {
                nb_input: self.nb_input(),
                nb_max_hidden: self.nb_max_hidden(),
                nb_output: self.nb_output(),
            }
        }
    }

    /// Загрузка хромосомы в сеть: базы копируются, связи канонизируются.
    /// Пустая хромосома целых оставляет связи как есть (сверточная сеть).
    pub fn load_chromosome(&mut self, floats: &[f32], ints: &[i32]) -> NeuraNetResult<()> {
        if floats.len() != self.ga_adn_float_length() {
            return Err(NeuraNetError::DimensionMismatch {
                what: "float chromosome",
                expected: self.ga_adn_float_length(),
                actual: floats.len(),
            });
        }
        if !ints.is_empty() {
            if ints.len() != self.ga_adn_int_length() {
                return Err(NeuraNetError::DimensionMismatch {
                    what: "int chromosome",
                    expected: self.ga_adn_int_length(),
                    actual: ints.len(),
                });
            }
            self.set_links(&links_from_adn(ints)?)?;
        }
        self.set_bases(floats)
    }

    /// Случайная хромосома вещественных генов в своих границах
    pub fn random_adn_float(&self, rng: &mut dyn RngCore) -> Vec<f32> {
        self.float_bounds()
            .into_iter()
            .map(|(lo, hi)| rng.gen_range(lo..=hi))
            .collect()
    }

    /// Случайная хромосома целых генов в своих границах
    pub fn random_adn_int(&self, rng: &mut dyn RngCore) -> Vec<i32> {
        self.int_bounds()
            .into_iter()
            .map(|(lo, hi)| rng.gen_range(lo..=hi))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Заглушка генетического алгоритма: просто запоминает границы
    #[derive(Default)]
    struct MockGenAlg {
        float: Vec<(f32, f32)>,
        int: Vec<(i32, i32)>,
    }

    impl MockGenAlg {
        fn new(len_float: usize, len_int: usize) -> Self {
            Self {
                float: vec![(0.0, 0.0); len_float],
                int: vec![(0, 0); len_int],
            }
        }
    }

    impl GenAlgBounds for MockGenAlg {
        fn adn_float_len(&self) -> usize {
            self.float.len()
        }

        fn adn_int_len(&self) -> usize {
            self.int.len()
        }

        fn set_bounds_adn_float(&mut self, gene: usize, bounds: (f32, f32)) {
            self.float[gene] = bounds;
        }

        fn set_bounds_adn_int(&mut self, gene: usize, bounds: (i32, i32)) {
            self.int[gene] = bounds;
        }
    }

    #[test]
    fn lengths_and_bounds() {
        let nn = NeuraNet::new(2, 3, 4, 5, 6).unwrap();
        assert_eq!(nn.ga_adn_float_length(), 15);
        assert_eq!(nn.ga_adn_int_length(), 18);
        let mut ga = MockGenAlg::new(15, 18);
        nn.set_ga_bounds_bases(&mut ga).unwrap();
        nn.set_ga_bounds_links(&mut ga).unwrap();
        assert!(ga.float.iter().all(|b| *b == (-1.0, 1.0)));
        assert_eq!(&ga.int[..3], &[(-1, 4), (0, 5), (2, 8)]);
        assert_eq!(&ga.int[15..], &[(-1, 4), (0, 5), (2, 8)]);

        let mut wrong = MockGenAlg::new(14, 18);
        assert!(nn.set_ga_bounds_bases(&mut wrong).is_err());
        let mut wrong = MockGenAlg::default();
        assert!(matches!(
            nn.set_ga_bounds_links(&mut wrong),
            Err(NeuraNetError::DimensionMismatch { what: "int chromosome", expected: 18, actual: 0 })
        ));
    }

    #[test]
    fn ga_type() {
        let nn = NeuraNet::new(2, 3, 4, 5, 6).unwrap();
        assert_eq!(
            nn.ga_type(),
            GenAlgNetType::Free { nb_input: 2, nb_max_hidden: 4, nb_output: 3 }
        );
        let topo = ConvTopology {
            dim_in: vec![4, 3],
            nb_output: 2,
            dim_cell: vec![2, 2],
            depth: 2,
            thickness: 2,
        };
        let nn = NeuraNet::convolution(&topo).unwrap();
        assert_eq!(
            nn.ga_type(),
            GenAlgNetType::Convolution {
                nb_input: 12,
                nb_max_hidden: 16,
                nb_output: 2,
                nb_bases_conv: 16,
                nb_bases_cell_conv: 4,
            }
        );
    }

    #[test]
    fn random_chromosomes_load() {
        let mut rng = ChaCha8Rng::from_seed(Default::default());
        let mut nn = NeuraNet::new(3, 2, 5, 4, 12).unwrap();
        let mut output = [0.0f32; 2];
        for _ in 0..100 {
            let floats = nn.random_adn_float(&mut rng);
            let ints = nn.random_adn_int(&mut rng);
            assert!(floats.iter().all(|v| (-1.0..=1.0).contains(v)));
            for (v, (lo, hi)) in ints.iter().zip(nn.int_bounds()) {
                assert!((lo..=hi).contains(v));
            }
            //любая хромосома в границах - допустимые связи
            nn.load_chromosome(&floats, &ints).unwrap();
            assert_eq!(nn.bases(), floats.as_slice());
            assert!(is_sorted_links(nn.links()));
            nn.eval(&[0.5, -0.5, 0.0], &mut output).unwrap();
        }
    }

    #[test]
    fn load_chromosome_bases_only() {
        let mut nn = NeuraNet::fully_connected(2, 1, &[]).unwrap();
        let links = nn.links().to_vec();
        nn.load_chromosome(&[0.5, 0.0, 0.0, 0.5, 0.0, 0.0], &[]).unwrap();
        assert_eq!(nn.links(), links.as_slice());
        assert!(nn.load_chromosome(&[0.0; 5], &[]).is_err());
        assert!(nn.load_chromosome(&[0.0; 6], &[0, 0, 2]).is_err());
    }
}
