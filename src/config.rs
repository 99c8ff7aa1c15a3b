use crate::*;
use std::env;

/// Настройки: топология сети, пул расчета, сохранение лучшей сети
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuraNetConfig {
    pub topology: TopologyConfig,
    pub pool: PoolConfig,
    pub persist: PersistConfig,
}

/// Как строится сеть
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyConfig {
    /// Пустая сеть заданной емкости, топологию находит генетический алгоритм
    Free {
        nb_input: usize,
        nb_output: usize,
        nb_max_hidden: usize,
        nb_max_bases: usize,
        nb_max_links: usize,
    },
    FullyConnected {
        nb_input: usize,
        nb_output: usize,
        #[serde(default)]
        hidden_layers: Vec<usize>,
    },
    Convolution(ConvTopology),
}

impl Default for TopologyConfig {
    fn default() -> Self {
        TopologyConfig::Free {
            nb_input: 1,
            nb_output: 1,
            nb_max_hidden: 0,
            nb_max_bases: 1,
            nb_max_links: 1,
        }
    }
}

impl TopologyConfig {
    pub fn build(&self) -> NeuraNetResult<NeuraNet> {
        match self {
            TopologyConfig::Free {
                nb_input,
                nb_output,
                nb_max_hidden,
                nb_max_bases,
                nb_max_links,
            } => NeuraNet::new(*nb_input, *nb_output, *nb_max_hidden, *nb_max_bases, *nb_max_links),
            TopologyConfig::FullyConnected {
                nb_input,
                nb_output,
                hidden_layers,
            } => {
                let layers: Vec<LayerTopology> =
                    hidden_layers.iter().map(|&n| LayerTopology::from(n)).collect();
                NeuraNet::fully_connected(*nb_input, *nb_output, &layers)
            }
            TopologyConfig::Convolution(topo) => NeuraNet::convolution(topo),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// JSON в одну строку
    pub compact: bool,
    /// Куда сохраняется лучшая сеть
    pub best_path: PathBuf,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            compact: true,
            best_path: PathBuf::from("./bestnn.txt"),
        }
    }
}

impl NeuraNetConfig {
    pub fn from_toml_str(content: &str) -> NeuraNetResult<Self> {
        let config: NeuraNetConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Проверка без построения сети
    pub fn validate(&self) -> NeuraNetResult<()> {
        if self.pool.workers == 0 {
            return Err(NeuraNetError::InvalidArgument("'pool.workers' must be > 0".into()));
        }
        if self.persist.best_path.as_os_str().is_empty() {
            return Err(NeuraNetError::InvalidArgument("'persist.best_path' is empty".into()));
        }
        match &self.topology {
            TopologyConfig::Free {
                nb_input,
                nb_output,
                nb_max_bases,
                nb_max_links,
                ..
            } => {
                if *nb_input == 0 || *nb_output == 0 || *nb_max_bases == 0 || *nb_max_links == 0 {
                    return Err(NeuraNetError::InvalidArgument(
                        "free topology sizes must be > 0".into(),
                    ));
                }
            }
            TopologyConfig::FullyConnected {
                nb_input,
                nb_output,
                hidden_layers,
            } => {
                if *nb_input == 0 || *nb_output == 0 || hidden_layers.contains(&0) {
                    return Err(NeuraNetError::InvalidArgument(
                        "fully connected sizes must be > 0".into(),
                    ));
                }
            }
            TopologyConfig::Convolution(topo) => topo.validate()?,
        }
        Ok(())
    }
}

/// Чтение настроек из TOML-файла, затем переопределение из переменных окружения
pub fn load_config<P: AsRef<Path>>(path: P) -> NeuraNetResult<NeuraNetConfig> {
    let content = fs::read_to_string(path.as_ref())?;
    let mut config: NeuraNetConfig = toml::from_str(&content)?;
    apply_environment_overrides(&mut config);
    config.validate()?;
    tracing::info!(path = %path.as_ref().display(), "config loaded");
    Ok(config)
}

/// Переменные окружения:
/// - `NEURANET_WORKERS` -> `pool.workers`
/// - `NEURANET_BEST_PATH` -> `persist.best_path`
/// - `NEURANET_COMPACT` -> `persist.compact`
pub fn apply_environment_overrides(config: &mut NeuraNetConfig) {
    if let Ok(value) = env::var("NEURANET_WORKERS") {
        if let Ok(workers) = value.parse::<usize>() {
            config.pool.workers = workers;
        }
    }
    if let Ok(value) = env::var("NEURANET_BEST_PATH") {
        config.persist.best_path = PathBuf::from(value);
    }
    if let Ok(value) = env::var("NEURANET_COMPACT") {
        config.persist.compact =
            value.to_lowercase() == "true" || value == "1" || value.to_lowercase() == "yes";
    }
}
