use crate::*;

/// Категории узлов в диаграмме: номер, цвет RGB, название
const CLOUD_CATEGORIES: [(u8, [u8; 3], &str); 3] = [
    (0, [255, 0, 0], "Input"),
    (1, [0, 255, 0], "Hidden"),
    (2, [0, 0, 255], "Output"),
];

impl NeuraNet {
    /// Категория значения по его номеру: 0 - вход, 1 - скрытое, 2 - выход
    fn cloud_category(&self, id: usize) -> u8 {
        if id < self.nb_input() {
            0
        } else if id < self.nb_input() + self.nb_max_hidden() {
            1
        } else {
            2
        }
    }

    /// Экспорт связей в текстовый формат CloudGraph:
    /// категории, затем узлы (номер, категория, подпись), затем активные связи.
    /// Учитываются все активные связи, в т.ч. после дыр, оставленных prune.
    pub fn write_cloud_graph<W: Write>(&self, mut writer: W) -> NeuraNetResult<()> {
        writeln!(writer, "{}", CLOUD_CATEGORIES.len())?;
        for (cat, [r, g, b], label) in CLOUD_CATEGORIES {
            writeln!(writer, "{cat} {r} {g} {b} {label}")?;
        }
        writeln!(writer, "{}", self.max_id())?;
        for id in 0..self.max_id() {
            writeln!(writer, "{id} {} {id}", self.cloud_category(id))?;
        }
        let active: Vec<&Link> = self.links().iter().filter(|l| l.is_active()).collect();
        writeln!(writer, "{}", active.len())?;
        for link in active {
            writeln!(writer, "{} {}", link.input, link.output)?;
        }
        Ok(())
    }

    pub fn save_cloud_graph<P: AsRef<Path>>(&self, path: P) -> NeuraNetResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(fs::File::create(path)?);
        self.write_cloud_graph(&mut writer)?;
        writer.flush()?;
        tracing::info!(path = %path.display(), "cloud graph saved");
        Ok(())
    }
}
