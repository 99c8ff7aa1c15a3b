use crate::*;

/// Сеть с топологией, заданной связями.
/// Размеры задаются при создании и больше не меняются:
/// -bases:  nb_max_bases * NB_PARAM_BASE параметров базовых функций
/// -links:  nb_max_links связей, всегда в каноническом виде (см. sort_links)
/// -hidden: nb_max_hidden скрытых значений (рабочий буфер расчета)
#[derive(Clone, Debug, PartialEq)]
pub struct NeuraNet {
    nb_input: usize,
    nb_output: usize,
    nb_max_hidden: usize,
    nb_max_bases: usize,
    nb_max_links: usize,
    /// Кол. базовых функций сверточных ячеек (0, если сеть не сверточная)
    nb_bases_conv: usize,
    /// Кол. базовых функций одной сверточной ячейки
    nb_bases_cell_conv: usize,
    bases: Vec<f32>,
    links: Vec<Link>,
    hidden: Vec<f32>,
}

/// Накопитель группы подряд идущих связей с одной парой (вход, выход).
/// Внутри группы вклады перемножаются, между группами - складываются в выход группы.
#[derive(Clone, Copy, Debug)]
struct LinkGroup {
    input: usize,
    output: usize,
    acc: f32,
}

impl LinkGroup {
    fn new(input: usize, output: usize) -> Self {
        Self { input, output, acc: 1.0 }
    }

    fn is_same(&self, input: usize, output: usize) -> bool {
        self.input == input && self.output == output
    }

    /// Сброс накопленного произведения в скрытое значение (с ограничением [-1,1])
    /// или в выход сети (без ограничения)
    fn flush(self, hidden: &mut [f32], output: &mut [f32], start_hid: usize, start_out: usize) {
        if self.output < start_out {
            let h = &mut hidden[self.output - start_hid];
            *h = (*h + self.acc).clamp(-1.0, 1.0);
        } else {
            output[self.output - start_out] += self.acc;
        }
    }
}

/// Вектор из `len` копий `value`; нехватка памяти - ошибка, а не паника
fn filled_vec<T: Clone>(what: &'static str, len: usize, value: T) -> NeuraNetResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|err| {
        NeuraNetError::InvalidArgument(format!("cannot allocate {len} {what}: {err}"))
    })?;
    v.resize(len, value);
    Ok(v)
}

impl NeuraNet {
    /// Конструктор: все связи отключены, параметры баз нулевые
    pub fn new(
        nb_input: usize,
        nb_output: usize,
        nb_max_hidden: usize,
        nb_max_bases: usize,
        nb_max_links: usize,
    ) -> NeuraNetResult<Self> {
        if nb_input == 0 {
            return Err(NeuraNetError::InvalidArgument("'nb_input' must be > 0".into()));
        }
        if nb_output == 0 {
            return Err(NeuraNetError::InvalidArgument("'nb_output' must be > 0".into()));
        }
        if nb_max_bases == 0 {
            return Err(NeuraNetError::InvalidArgument("'nb_max_bases' must be > 0".into()));
        }
        if nb_max_links == 0 {
            return Err(NeuraNetError::InvalidArgument("'nb_max_links' must be > 0".into()));
        }
        //номера связей хранятся в i32
        let max_id = nb_input
            .checked_add(nb_max_hidden)
            .and_then(|n| n.checked_add(nb_output));
        if max_id.map_or(true, |n| i32::try_from(n).is_err()) {
            return Err(NeuraNetError::InvalidArgument(format!(
                "too many values ({nb_input} + {nb_max_hidden} + {nb_output})"
            )));
        }
        let nb_bases_val = nb_max_bases
            .checked_mul(NB_PARAM_BASE)
            .filter(|_| i32::try_from(nb_max_bases).is_ok() && i32::try_from(nb_max_links).is_ok());
        let Some(nb_bases_val) = nb_bases_val else {
            return Err(NeuraNetError::InvalidArgument(format!(
                "too many bases ({nb_max_bases}) or links ({nb_max_links})"
            )));
        };
        Ok(Self {
            nb_input,
            nb_output,
            nb_max_hidden,
            nb_max_bases,
            nb_max_links,
            nb_bases_conv: 0,
            nb_bases_cell_conv: 0,
            bases: filled_vec("bases", nb_bases_val, 0.0)?,
            links: filled_vec("links", nb_max_links, Link::INACTIVE)?,
            hidden: filled_vec("hidden values", nb_max_hidden, 0.0)?,
        })
    }

    /// Запоминает разбиение баз сверточной сети (вызывается генератором и загрузкой)
    pub(crate) fn with_conv_bases(mut self, nb_bases_conv: usize, nb_bases_cell_conv: usize) -> Self {
        self.nb_bases_conv = nb_bases_conv;
        self.nb_bases_cell_conv = nb_bases_cell_conv;
        self
    }

    pub fn nb_input(&self) -> usize {
        self.nb_input
    }

    pub fn nb_output(&self) -> usize {
        self.nb_output
    }

    pub fn nb_max_hidden(&self) -> usize {
        self.nb_max_hidden
    }

    pub fn nb_max_bases(&self) -> usize {
        self.nb_max_bases
    }

    pub fn nb_max_links(&self) -> usize {
        self.nb_max_links
    }

    pub fn nb_bases_conv(&self) -> usize {
        self.nb_bases_conv
    }

    pub fn nb_bases_cell_conv(&self) -> usize {
        self.nb_bases_cell_conv
    }

    /// Размер общей нумерации значений: входы + скрытые + выходы
    pub fn max_id(&self) -> usize {
        self.nb_input + self.nb_max_hidden + self.nb_output
    }

    /// Параметры базовых функций (по NB_PARAM_BASE на функцию)
    pub fn bases(&self) -> &[f32] {
        &self.bases
    }

    pub fn bases_mut(&mut self) -> &mut [f32] {
        &mut self.bases
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Кол. активных связей до стоп-метки
    pub fn nb_active_links(&self) -> usize {
        self.links.iter().take_while(|l| l.is_active()).count()
    }

    /// Скрытые значения после последнего расчета
    pub fn hidden_values(&self) -> &[f32] {
        &self.hidden
    }

    pub fn hidden_value(&self, i: usize) -> NeuraNetResult<f32> {
        self.hidden.get(i).copied().ok_or(NeuraNetError::IndexOutOfRange {
            what: "hidden value",
            index: i,
            len: self.nb_max_hidden,
        })
    }

    /// Копирование параметров базовых функций
    pub fn set_bases(&mut self, bases: &[f32]) -> NeuraNetResult<()> {
        if bases.len() != self.bases.len() {
            return Err(NeuraNetError::DimensionMismatch {
                what: "bases",
                expected: self.bases.len(),
                actual: bases.len(),
            });
        }
        self.bases.copy_from_slice(bases);
        Ok(())
    }

    /// Установка i-го параметра (не i-й функции!) базовых функций
    pub fn set_base_param(&mut self, i: usize, value: f32) -> NeuraNetResult<()> {
        let len = self.bases.len();
        let p = self.bases.get_mut(i).ok_or(NeuraNetError::IndexOutOfRange {
            what: "base parameter",
            index: i,
            len,
        })?;
        *p = value;
        Ok(())
    }

    /// Установка связей: проверка, упорядочивание концов, сортировка по (вход, выход),
    /// отключенные связи в конец. `links` может быть не отсортирован.
    /// При ошибке связи сети не меняются.
    pub fn set_links(&mut self, links: &[Link]) -> NeuraNetResult<()> {
        if links.len() != self.nb_max_links {
            return Err(NeuraNetError::DimensionMismatch {
                what: "links",
                expected: self.nb_max_links,
                actual: links.len(),
            });
        }
        for (index, link) in links.iter().enumerate() {
            self.check_link(index, link)?;
        }
        let nb_active = sort_links(links, self.max_id(), &mut self.links);
        tracing::debug!(nb_active, nb_max_links = self.nb_max_links, "links set");
        Ok(())
    }

    /// Повторная канонизация текущих связей (например, после prune)
    pub fn compact_links(&mut self) {
        let links = self.links.clone();
        sort_links(&links, self.max_id(), &mut self.links);
    }

    /// Связи как есть, без сортировки (загрузка сохраненной сети).
    /// Если порядок оказался не каноническим - связи сортируются.
    pub(crate) fn install_links(&mut self, links: &[Link]) -> NeuraNetResult<()> {
        if links.len() != self.nb_max_links {
            return Err(NeuraNetError::DimensionMismatch {
                what: "links",
                expected: self.nb_max_links,
                actual: links.len(),
            });
        }
        for (index, link) in links.iter().enumerate() {
            self.check_link(index, link)?;
        }
        //после prune в активной части могут быть дыры, это допустимо
        let in_order = links
            .iter()
            .filter(|l| l.is_active())
            .tuple_windows()
            .all(|(a, b)| (a.input, a.output) <= (b.input, b.output));
        if in_order && links.iter().all(|l| !l.is_active() || l.input <= l.output) {
            self.links.copy_from_slice(links);
        } else {
            tracing::warn!("loaded links are not in canonical order, sorting them");
            sort_links(links, self.max_id(), &mut self.links);
        }
        Ok(())
    }

    /// Проверка одной связи. Отключенные связи не проверяются.
    fn check_link(&self, index: usize, link: &Link) -> NeuraNetResult<()> {
        if !link.is_active() {
            return Ok(());
        }
        let invalid = |reason: String| NeuraNetError::InvalidLink { index, link: *link, reason };
        if link.base < -1 || link.base as usize >= self.nb_max_bases {
            return Err(invalid(format!("base must be in [-1, {})", self.nb_max_bases)));
        }
        let max_id = self.max_id() as i32;
        for id in [link.input, link.output] {
            if id < 0 || id >= max_id {
                return Err(invalid(format!("endpoint {id} outside [0, {max_id})")));
            }
        }
        let c = link.canonical();
        //выход сети не может быть источником, вход сети - приемником
        if c.input as usize >= self.nb_input + self.nb_max_hidden {
            return Err(invalid("both endpoints are outputs".into()));
        }
        if (c.output as usize) < self.nb_input {
            return Err(invalid("both endpoints are inputs".into()));
        }
        Ok(())
    }

    /// Расчет выходов сети для входов `input` (ожидаются в [-1,1]).
    /// `output` полностью перезаписывается.
    /// Связи обходятся в порядке сортировки до первой отключенной. Подряд идущие связи
    /// с одной парой (вход, выход) перемножаются, результат прибавляется к выходу пары.
    /// Скрытые значения читаются такими, какими они накоплены к этому моменту обхода,
    /// т.е. порядок связей задает порядок расчета.
    pub fn eval(&mut self, input: &[f32], output: &mut [f32]) -> NeuraNetResult<()> {
        if input.len() != self.nb_input {
            return Err(NeuraNetError::DimensionMismatch {
                what: "input",
                expected: self.nb_input,
                actual: input.len(),
            });
        }
        if output.len() != self.nb_output {
            return Err(NeuraNetError::DimensionMismatch {
                what: "output",
                expected: self.nb_output,
                actual: output.len(),
            });
        }
        self.hidden.fill(0.0);
        output.fill(0.0);
        let start_hid = self.nb_input;
        let start_out = self.nb_input + self.nb_max_hidden;
        let mut group: Option<LinkGroup> = None;
        for link in self.links.iter().take_while(|l| l.is_active()) {
            let (src, dst) = (link.input as usize, link.output as usize);
            let cur = match group {
                Some(g) if g.is_same(src, dst) => g,
                Some(g) => {
                    g.flush(&mut self.hidden, output, start_hid, start_out);
                    LinkGroup::new(src, dst)
                }
                None => LinkGroup::new(src, dst),
            };
            let x = if src < start_hid {
                input[src]
            } else {
                self.hidden[src - start_hid]
            };
            let j = link.base as usize * NB_PARAM_BASE;
            let y = base_fun(&self.bases[j..j + NB_PARAM_BASE], x);
            group = Some(LinkGroup { acc: cur.acc * y, ..cur });
        }
        if let Some(g) = group {
            g.flush(&mut self.hidden, output, start_hid, start_out);
        }
        Ok(())
    }

    /// Отключение связей, ведущих в скрытые значения, которые дальше по порядку связей
    /// нигде не читаются. Один проход, только вперед, связи не пересортировываются.
    /// Возвращает кол. отключенных связей.
    pub fn prune(&mut self) -> usize {
        let start_hid = self.nb_input as i32;
        let start_out = (self.nb_input + self.nb_max_hidden) as i32;
        //решение принимается по состоянию до прохода
        let dead: Vec<usize> = self
            .links
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_active() && l.output >= start_hid && l.output < start_out)
            .filter(|(i, l)| {
                !self.links[i + 1..]
                    .iter()
                    .any(|next| next.is_active() && next.input == l.output)
            })
            .map(|(i, _)| i)
            .collect();
        for &i in &dead {
            self.links[i].base = -1;
        }
        tracing::debug!(pruned = dead.len(), "prune");
        dead.len()
    }

    /// Индекс разнообразия Симпсона по распределению пар (источник, скрытое значение):
    /// n_i - кол. разных скрытых значений, питаемых источником i, N = сумма n_i.
    /// 1 - sum(n_i*(n_i-1)) / (N*(N-1)), умноженное на N / nb_max_links, в [-1,1].
    /// 0, если таких пар меньше 2.
    pub fn hidden_value_simpson_diversity(&self) -> f32 {
        let start_hid = self.nb_input as i32;
        let start_out = (self.nb_input + self.nb_max_hidden) as i32;
        //связи отсортированы: одинаковые пары и одинаковые источники идут подряд
        let counts: Vec<usize> = self
            .links
            .iter()
            .take_while(|l| l.is_active())
            .filter(|l| l.output >= start_hid && l.output < start_out)
            .map(|l| (l.input, l.output))
            .dedup()
            .chunk_by(|(src, _)| *src)
            .into_iter()
            .map(|(_, pairs)| pairs.count())
            .collect();
        let n: usize = counts.iter().sum();
        if n < 2 {
            return 0.0;
        }
        let sum: usize = counts.iter().map(|&c| c * (c - 1)).sum();
        let index = 1.0 - sum as f32 / (n * (n - 1)) as f32;
        (index * n as f32 / self.nb_max_links as f32).clamp(-1.0, 1.0)
    }
}

impl fmt::Display for NeuraNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nbInput: {}", self.nb_input)?;
        writeln!(f, "nbOutput: {}", self.nb_output)?;
        writeln!(f, "nbHidden: {}", self.nb_max_hidden)?;
        writeln!(f, "nbMaxBases: {}", self.nb_max_bases)?;
        writeln!(f, "nbMaxLinks: {}", self.nb_max_links)?;
        writeln!(f, "bases: <{}>", self.bases.iter().map(|b| format!("{b:.6}")).join(","))?;
        writeln!(
            f,
            "links: <{}>",
            self.links
                .iter()
                .map(|l| format!("{},{},{}", l.base, l.input, l.output))
                .join(",")
        )?;
        write!(f, "hidden values: <{}>", self.hidden.iter().map(|h| format!("{h:.6}")).join(","))
    }
}
