use crate::*;

/// Кол. параметров одной связи (база, вход, выход)
pub const NB_PARAM_LINK: usize = 3;

/// Связь сети: (№ базовой функции, № входа, № выхода).
/// Номера входов/выходов - общая нумерация: сначала входы сети, потом скрытые значения,
/// потом выходы сети. base == -1 означает, что связь отключена.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub base: i32,
    pub input: i32,
    pub output: i32,
}

impl Link {
    /// Отключенная связь
    pub const INACTIVE: Link = Link { base: -1, input: 0, output: 0 };

    pub fn new(base: i32, input: i32, output: i32) -> Self {
        Self { base, input, output }
    }

    pub fn is_active(&self) -> bool {
        self.base != -1
    }

    /// Та же связь с упорядоченными концами: input <= output
    pub fn canonical(self) -> Self {
        if self.input > self.output {
            Self { base: self.base, input: self.output, output: self.input }
        } else {
            self
        }
    }

    /// Ключ сортировки для связи с упорядоченными концами
    fn sort_key(&self, max_id: i64) -> i64 {
        i64::from(self.input) * max_id + i64::from(self.output)
    }
}

impl From<(i32, i32, i32)> for Link {
    fn from((base, input, output): (i32, i32, i32)) -> Self {
        Self { base, input, output }
    }
}

/// Связи из плоской хромосомы целых (по NB_PARAM_LINK значений на связь)
pub fn links_from_adn(adn: &[i32]) -> NeuraNetResult<Vec<Link>> {
    if adn.len() % NB_PARAM_LINK != 0 {
        return Err(NeuraNetError::InvalidArgument(format!(
            "int chromosome length {} is not a multiple of {}",
            adn.len(),
            NB_PARAM_LINK
        )));
    }
    Ok(adn
        .chunks_exact(NB_PARAM_LINK)
        .map(|c| Link::new(c[0], c[1], c[2]))
        .collect())
}

/// Плоская хромосома целых из связей
pub fn links_to_adn(links: &[Link]) -> Vec<i32> {
    links
        .iter()
        .flat_map(|l| [l.base, l.input, l.output])
        .collect()
}

/// Приведение набора связей к каноническому виду.
/// Активные связи: концы упорядочены, сортировка по (вход, выход), одинаковые пары
/// не сливаются и сохраняют исходный порядок. Хвост `dst` заполняется отключенными
/// связями, первая из них - стоп-метка для последовательного обхода.
/// Возвращает кол. активных связей.
pub fn sort_links(links: &[Link], max_id: usize, dst: &mut [Link]) -> usize {
    debug_assert!(links.len() <= dst.len());
    let max_id = max_id as i64;
    let mut active: Vec<Link> = links
        .iter()
        .filter(|l| l.is_active())
        .map(|l| l.canonical())
        .collect();
    //сортировка устойчивая: дубликаты остаются в порядке поступления
    active.sort_by_key(|l| l.sort_key(max_id));
    let nb_active = active.len();
    dst[..nb_active].copy_from_slice(&active);
    dst[nb_active..].fill(Link::INACTIVE);
    nb_active
}

/// Проверка канонического вида: активные связи идут первыми, концы упорядочены,
/// пары (вход, выход) не убывают
pub fn is_sorted_links(links: &[Link]) -> bool {
    let nb_active = links.iter().take_while(|l| l.is_active()).count();
    let active = &links[..nb_active];
    active.iter().all(|l| l.input <= l.output)
        && active
            .iter()
            .tuple_windows()
            .all(|(a, b)| (a.input, a.output) <= (b.input, b.output))
        && links[nb_active..].iter().all(|l| !l.is_active())
}
