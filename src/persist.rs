use crate::*;

/// Вектор в сохраненном документе: размер и значения
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct VecNode<T> {
    _dim: usize,
    _val: Vec<T>,
}

impl<T: Clone> VecNode<T> {
    fn new(val: &[T]) -> Self {
        Self { _dim: val.len(), _val: val.to_vec() }
    }

    fn into_checked(self, what: &'static str, expected: usize) -> NeuraNetResult<Vec<T>> {
        if self._dim != self._val.len() || self._dim != expected {
            return Err(NeuraNetError::DimensionMismatch {
                what,
                expected,
                actual: self._val.len(),
            });
        }
        Ok(self._val)
    }
}

fn is_zero(v: &usize) -> bool {
    *v == 0
}

/// Сохраненная сеть
#[derive(Debug, Serialize, Deserialize)]
struct NeuraNetDoc {
    #[serde(rename = "_nbInputVal")]
    nb_input: usize,
    #[serde(rename = "_nbOutputVal")]
    nb_output: usize,
    #[serde(rename = "_nbMaxHidVal")]
    nb_max_hidden: usize,
    #[serde(rename = "_nbMaxBases")]
    nb_max_bases: usize,
    #[serde(rename = "_nbMaxLinks")]
    nb_max_links: usize,
    #[serde(rename = "_nbBasesConv", default, skip_serializing_if = "is_zero")]
    nb_bases_conv: usize,
    #[serde(rename = "_nbBasesCellConv", default, skip_serializing_if = "is_zero")]
    nb_bases_cell_conv: usize,
    #[serde(rename = "_bases")]
    bases: VecNode<f32>,
    /// Связи плоско: база, вход, выход, ...
    #[serde(rename = "_links")]
    links: VecNode<i32>,
}

impl NeuraNet {
    /// Запись сети в JSON. `compact` - в одну строку, иначе с отступами
    pub fn save<W: Write>(&self, writer: W, compact: bool) -> NeuraNetResult<()> {
        let doc = NeuraNetDoc {
            nb_input: self.nb_input(),
            nb_output: self.nb_output(),
            nb_max_hidden: self.nb_max_hidden(),
            nb_max_bases: self.nb_max_bases(),
            nb_max_links: self.nb_max_links(),
            nb_bases_conv: self.nb_bases_conv(),
            nb_bases_cell_conv: self.nb_bases_cell_conv(),
            bases: VecNode::new(self.bases()),
            links: VecNode::new(&links_to_adn(self.links())),
        };
        if compact {
            serde_json::to_writer(writer, &doc)?;
        } else {
            serde_json::to_writer_pretty(writer, &doc)?;
        }
        Ok(())
    }

    /// Чтение сети из JSON. Любое отсутствующее или неверное поле - ошибка.
    pub fn load<R: Read>(reader: R) -> NeuraNetResult<Self> {
        let doc: NeuraNetDoc = serde_json::from_reader(reader)?;
        //размеры массивов сверяются до выделения памяти под сеть
        let nb_bases_val = doc.nb_max_bases.checked_mul(NB_PARAM_BASE).ok_or_else(|| {
            NeuraNetError::InvalidArgument(format!("'_nbMaxBases' {} is too large", doc.nb_max_bases))
        })?;
        let nb_links_val = doc.nb_max_links.checked_mul(NB_PARAM_LINK).ok_or_else(|| {
            NeuraNetError::InvalidArgument(format!("'_nbMaxLinks' {} is too large", doc.nb_max_links))
        })?;
        let bases = doc.bases.into_checked("bases", nb_bases_val)?;
        let links = doc.links.into_checked("links", nb_links_val)?;
        let mut nn = NeuraNet::new(
            doc.nb_input,
            doc.nb_output,
            doc.nb_max_hidden,
            doc.nb_max_bases,
            doc.nb_max_links,
        )?;
        nn.set_bases(&bases)?;
        //порядок связей сохраняется как есть (в т.ч. дыры после prune)
        nn.install_links(&links_from_adn(&links)?)?;
        Ok(nn.with_conv_bases(doc.nb_bases_conv, doc.nb_bases_cell_conv))
    }

    /// Сохранение в файл через временный файл и переименование,
    /// чтобы на диске никогда не оказалось недописанной сети
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P, compact: bool) -> NeuraNetResult<()> {
        let path = path.as_ref();
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        {
            let mut writer = BufWriter::new(fs::File::create(&tmp)?);
            self.save(&mut writer, compact)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        tracing::info!(path = %path.display(), "net saved");
        Ok(())
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> NeuraNetResult<Self> {
        let path = path.as_ref();
        let nn = Self::load(std::io::BufReader::new(fs::File::open(path)?))?;
        tracing::info!(path = %path.display(), "net loaded");
        Ok(nn)
    }
}
