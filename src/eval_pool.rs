use crate::*;
use rayon::prelude::*;

/// Хромосома одной особи популяции
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    /// Параметры баз
    pub floats: Vec<f32>,
    /// Связи; пустой вектор - связи шаблона не меняются
    pub ints: Vec<i32>,
}

impl Chromosome {
    pub fn new(floats: Vec<f32>, ints: Vec<i32>) -> Self {
        Self { floats, ints }
    }

    /// Случайная особь в границах генов сети
    pub fn random(nn: &NeuraNet, rng: &mut dyn RngCore) -> Self {
        Self {
            floats: nn.random_adn_float(rng),
            ints: nn.random_adn_int(rng),
        }
    }
}

/// Пул потоков для расчета приспособленности популяции.
/// Каждый поток работает со своей копией сети-шаблона, общих изменяемых данных нет.
pub struct EvalPool {
    pool: rayon::ThreadPool,
    template: NeuraNet,
}

impl EvalPool {
    pub fn new(workers: usize, template: NeuraNet) -> NeuraNetResult<Self> {
        if workers == 0 {
            return Err(NeuraNetError::InvalidArgument("'workers' must be > 0".into()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("neuranet-eval-{i}"))
            .build()?;
        Ok(Self { pool, template })
    }

    pub fn from_config(config: &PoolConfig, template: NeuraNet) -> NeuraNetResult<Self> {
        Self::new(config.workers, template)
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn template(&self) -> &NeuraNet {
        &self.template
    }

    /// Приспособленность каждой особи: хромосома загружается в копию шаблона,
    /// затем вызывается `fitness`. Результаты в порядке популяции.
    /// Ошибка одной особи не прерывает расчет остальных.
    pub fn evaluate<F>(&self, population: &[Chromosome], fitness: F) -> Vec<NeuraNetResult<f32>>
    where
        F: Fn(&mut NeuraNet) -> NeuraNetResult<f32> + Sync,
    {
        tracing::debug!(population = population.len(), workers = self.workers(), "evaluate");
        self.pool.install(|| {
            population
                .par_iter()
                .map_init(
                    || self.template.clone(),
                    |nn, chromosome| {
                        nn.load_chromosome(&chromosome.floats, &chromosome.ints)?;
                        fitness(nn)
                    },
                )
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Средняя ошибка сети на задаче "выход = сумма входов / 2"
    fn half_sum_fitness(nn: &mut NeuraNet) -> NeuraNetResult<f32> {
        let mut output = [0.0f32; 1];
        let mut err = 0.0;
        let mut nb = 0;
        for i in -4..=4 {
            for j in -4..=4 {
                let input = [0.25 * i as f32, 0.25 * j as f32];
                nn.eval(&input, &mut output)?;
                err += (output[0] - 0.5 * (input[0] + input[1])).abs();
                nb += 1;
            }
        }
        Ok(-err / nb as f32)
    }

    #[test]
    fn parallel_equals_sequential() {
        let template = NeuraNet::new(2, 1, 3, 4, 8).unwrap();
        let mut rng = ChaCha8Rng::from_seed(Default::default());
        let population: Vec<Chromosome> =
            (0..40).map(|_| Chromosome::random(&template, &mut rng)).collect();
        let pool = EvalPool::new(4, template.clone()).unwrap();
        assert_eq!(pool.workers(), 4);
        let results = pool.evaluate(&population, half_sum_fitness);
        assert_eq!(results.len(), population.len());
        for (chromosome, result) in population.iter().zip(&results) {
            let mut nn = template.clone();
            nn.load_chromosome(&chromosome.floats, &chromosome.ints).unwrap();
            let expected = half_sum_fitness(&mut nn).unwrap();
            assert_eq!(*result.as_ref().unwrap(), expected);
        }
    }

    #[test]
    fn errors_stay_per_chromosome() {
        let template = NeuraNet::fully_connected(2, 1, &[]).unwrap();
        let good = Chromosome::new(vec![0.5, 0.0, 0.0, 0.5, 0.0, 0.0], vec![]);
        let bad = Chromosome::new(vec![0.0; 3], vec![]);
        let pool = EvalPool::new(2, template).unwrap();
        let results = pool.evaluate(&[good.clone(), bad, good], half_sum_fitness);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(NeuraNetError::DimensionMismatch { .. })));
        assert!(results[2].is_ok());
        //шаблон не меняется
        assert!(pool.template().bases().iter().all(|b| *b == 0.0));
    }

    #[test]
    fn no_workers() {
        let template = NeuraNet::new(1, 1, 0, 1, 1).unwrap();
        assert!(EvalPool::new(0, template).is_err());
    }
}
