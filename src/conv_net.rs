use crate::*;
use itertools::iproduct;

/// Топология сверточной сети.
/// `depth` уровней свертки, на каждом `thickness` параллельных каналов.
/// Ячейка `dim_cell` скользит по слою с шагом 1 без дополнения, так что каждый
/// следующий слой меньше предыдущего на `dim_cell - 1` по каждому измерению.
/// Последний слой свертки полносвязно соединен с выходами сети.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvTopology {
    pub dim_in: Vec<usize>,
    pub nb_output: usize,
    pub dim_cell: Vec<usize>,
    pub depth: usize,
    pub thickness: usize,
}

/// Номер позиции в слое размеров `dim`, 1-е измерение меняется быстрее всех
fn flat_index(pos: &[usize], dim: &[usize]) -> usize {
    pos.iter().zip(dim).rev().fold(0, |acc, (p, d)| acc * d + p)
}

/// Все позиции внутри слоя размеров `dim`
fn positions(dim: &[usize]) -> impl Iterator<Item = Vec<usize>> + '_ {
    dim.iter().map(|&d| 0..d).multi_cartesian_product()
}

impl ConvTopology {
    pub fn validate(&self) -> NeuraNetResult<()> {
        let invalid = |msg: String| Err(NeuraNetError::InvalidArgument(msg));
        if self.dim_in.is_empty() || self.dim_in.contains(&0) {
            return invalid(format!("'dim_in' {:?} is invalid", self.dim_in));
        }
        if self.dim_cell.len() != self.dim_in.len() || self.dim_cell.contains(&0) {
            return invalid(format!(
                "'dim_cell' {:?} is invalid for 'dim_in' {:?}",
                self.dim_cell, self.dim_in
            ));
        }
        if self.nb_output == 0 {
            return invalid("'nb_output' must be > 0".into());
        }
        if self.depth == 0 {
            return invalid("'depth' must be > 0".into());
        }
        if self.thickness == 0 {
            return invalid("'thickness' must be > 0".into());
        }
        //каждый канал каждого уровня дает хотя бы одно скрытое значение с номером в i32
        if self.depth.checked_mul(self.thickness).map_or(true, |n| i32::try_from(n).is_err()) {
            return invalid(format!(
                "too many levels: depth {} x thickness {}",
                self.depth, self.thickness
            ));
        }
        //ячейка должна помещаться в слой на каждом уровне
        let fits = |d: usize, c: usize| {
            self.depth
                .checked_mul(c - 1)
                .and_then(|n| n.checked_add(1))
                .is_some_and(|min_dim| d >= min_dim)
        };
        if self.dim_in.iter().zip(&self.dim_cell).any(|(&d, &c)| !fits(d, c)) {
            return invalid(format!(
                "cell {:?} does not fit {} times in {:?}",
                self.dim_cell, self.depth, self.dim_in
            ));
        }
        Ok(())
    }

    /// Размеры слоев: входной, затем выходной каждого уровня (depth + 1 штук)
    fn layer_dims(&self) -> Vec<Vec<usize>> {
        std::iter::successors(Some(self.dim_in.clone()), |dim| {
            Some(dim.iter().zip(&self.dim_cell).map(|(d, c)| d + 1 - c).collect())
        })
        .take(self.depth + 1)
        .collect()
    }
}

impl NeuraNet {
    /// Сверточная сеть.
    /// Скрытые значения уровня идут блоками по каналам: [канал 0][канал 1]...
    /// База связи зависит только от (уровень, канал, позиция в ячейке), т.е. общая
    /// для всех положений ячейки. Связи к выходам имеют каждая свою базу.
    pub fn convolution(topo: &ConvTopology) -> NeuraNetResult<Self> {
        topo.validate()?;
        let too_large =
            || NeuraNetError::InvalidArgument(format!("convolution {topo:?} is too large"));
        let product = |dim: &[usize]| dim.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
        let layers = topo.layer_dims();
        let sizes: Vec<usize> = layers
            .iter()
            .map(|d| product(d.as_slice()))
            .collect::<Option<_>>()
            .ok_or_else(too_large)?;
        let thick = topo.thickness;
        let nb_output = topo.nb_output;
        let cell_size = product(topo.dim_cell.as_slice()).ok_or_else(too_large)?;
        let nb_input = sizes[0];
        let nb_hidden = sizes[1..]
            .iter()
            .try_fold(0usize, |acc, &s| acc.checked_add(s))
            .and_then(|n| n.checked_mul(thick))
            .ok_or_else(too_large)?;
        let size_last = sizes[topo.depth];
        let nb_bases_conv = (topo.depth * thick).checked_mul(cell_size).ok_or_else(too_large)?;
        let nb_links_out = size_last
            .checked_mul(thick)
            .and_then(|n| n.checked_mul(nb_output))
            .ok_or_else(too_large)?;
        let nb_links = nb_hidden
            .checked_mul(cell_size)
            .and_then(|n| n.checked_add(nb_links_out))
            .ok_or_else(too_large)?;
        let nb_bases = nb_bases_conv.checked_add(nb_links_out).ok_or_else(too_large)?;
        let mut nn = NeuraNet::new(nb_input, nb_output, nb_hidden, nb_bases, nb_links)?;

        let cells: Vec<Vec<usize>> = positions(&topo.dim_cell).collect();
        let mut links: Vec<Link> = Vec::with_capacity(nb_links);
        let mut start_in = 0;
        //0 на 1-м уровне: все каналы читают входы сети
        let mut stride_in = 0;
        let mut start_out = nb_input;
        for (level, (dim_in, dim_out)) in layers.iter().tuple_windows().enumerate() {
            let size_out = sizes[level + 1];
            for pos in positions(dim_out) {
                let i_out = flat_index(&pos, dim_out);
                for cell in &cells {
                    let src: Vec<usize> = pos.iter().zip(cell).map(|(p, c)| p + c).collect();
                    let i_in = flat_index(&src, dim_in);
                    let i_cell = flat_index(cell, &topo.dim_cell);
                    for t in 0..thick {
                        links.push(Link::new(
                            ((level * thick + t) * cell_size + i_cell) as i32,
                            (start_in + t * stride_in + i_in) as i32,
                            (start_out + t * size_out + i_out) as i32,
                        ));
                    }
                }
            }
            start_in = start_out;
            stride_in = size_out;
            start_out += thick * size_out;
        }
        //последний слой -> выходы
        let start_net_out = nb_input + nb_hidden;
        for (k, (i_layer, t, i_out)) in iproduct!(0..size_last, 0..thick, 0..nb_output).enumerate() {
            links.push(Link::new(
                (nb_bases_conv + k) as i32,
                (start_in + i_layer * thick + t) as i32,
                (start_net_out + i_out) as i32,
            ));
        }
        nn.set_links(&links)?;
        tracing::debug!(nb_input, nb_hidden, nb_links, nb_bases_conv, "convolution net created");
        Ok(nn.with_conv_bases(nb_bases_conv, cell_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topo(dim_in: &[usize], nb_output: usize, dim_cell: &[usize], depth: usize, thickness: usize) -> ConvTopology {
        ConvTopology {
            dim_in: dim_in.to_vec(),
            nb_output,
            dim_cell: dim_cell.to_vec(),
            depth,
            thickness,
        }
    }

    #[test]
    fn flat() {
        assert_eq!(flat_index(&[0, 0], &[4, 3]), 0);
        assert_eq!(flat_index(&[1, 0], &[4, 3]), 1);
        assert_eq!(flat_index(&[0, 1], &[4, 3]), 4);
        assert_eq!(flat_index(&[3, 2], &[4, 3]), 11);
        assert_eq!(positions(&[2, 3]).count(), 6);
    }

    #[test]
    fn convolution() {
        let nn = NeuraNet::convolution(&topo(&[4, 3], 2, &[2, 2], 2, 2)).unwrap();
        assert_eq!(nn.nb_input(), 12);
        assert_eq!(nn.nb_output(), 2);
        assert_eq!(nn.nb_max_hidden(), 16);
        assert_eq!(nn.nb_max_bases(), 24);
        assert_eq!(nn.nb_max_links(), 72);
        assert_eq!(nn.nb_bases_conv(), 16);
        assert_eq!(nn.nb_bases_cell_conv(), 4);
        let expected: Vec<i32> = vec![
            0, 0, 12, 4, 0, 18, 1, 1, 12, 0, 1, 13, 5, 1, 18, 4, 1, 19,
            1, 2, 13, 0, 2, 14, 5, 2, 19, 4, 2, 20, 1, 3, 14, 5, 3, 20,
            2, 4, 12, 0, 4, 15, 6, 4, 18, 4, 4, 21, 3, 5, 12, 2, 5, 13,
            1, 5, 15, 0, 5, 16, 7, 5, 18, 6, 5, 19, 5, 5, 21, 4, 5, 22,
            3, 6, 13, 2, 6, 14, 1, 6, 16, 0, 6, 17, 7, 6, 19, 6, 6, 20,
            5, 6, 22, 4, 6, 23, 3, 7, 14, 1, 7, 17, 7, 7, 20, 5, 7, 23,
            2, 8, 15, 6, 8, 21, 3, 9, 15, 2, 9, 16, 7, 9, 21, 6, 9, 22,
            3, 10, 16, 2, 10, 17, 7, 10, 22, 6, 10, 23, 3, 11, 17, 7, 11, 23,
            8, 12, 24, 9, 13, 24, 8, 13, 25, 9, 14, 25, 10, 15, 24, 11, 16, 24,
            10, 16, 25, 11, 17, 25, 12, 18, 26, 13, 19, 26, 12, 19, 27, 13, 20, 27,
            14, 21, 26, 15, 22, 26, 14, 22, 27, 15, 23, 27, 16, 24, 28, 17, 24, 29,
            18, 25, 28, 19, 25, 29, 20, 26, 28, 21, 26, 29, 22, 27, 28, 23, 27, 29,
        ];
        assert_eq!(links_to_adn(nn.links()), expected);
        assert_eq!(nn.nb_active_links(), 72);
    }

    #[test]
    fn shared_bases() {
        //3 входа (0..3), 2 скрытых (3,4), 1 выход (5)
        let mut nn = NeuraNet::convolution(&topo(&[3], 1, &[2], 1, 1)).unwrap();
        assert_eq!(
            links_to_adn(nn.links()),
            vec![0, 0, 3, 1, 1, 3, 0, 1, 4, 1, 2, 4, 2, 3, 5, 3, 4, 5]
        );
        //база 0: константа 0.5, база 1: тождество, выходные базы: тождество
        nn.set_bases(&[0.0, 0.0, 0.5, 0.5, 0.0, 0.0, 0.5, 0.0, 0.0, 0.5, 0.0, 0.0]).unwrap();
        let mut output = [0.0f32];
        nn.eval(&[0.1, 0.2, 0.3], &mut output).unwrap();
        let t = (0.5 * NN_THETA).tan();
        //разные пары (вход, выход) складываются
        let h = [0.5 + t * 0.2, 0.5 + t * 0.3];
        approx::assert_relative_eq!(nn.hidden_values(), h.as_slice(), epsilon = 1e-6);
        approx::assert_relative_eq!(output[0], t * (h[0] + h[1]), epsilon = 1e-6);
    }

    #[test]
    fn invalid() {
        let bad = [
            topo(&[], 1, &[], 1, 1),
            topo(&[4, 0], 1, &[2, 2], 1, 1),
            topo(&[4, 3], 1, &[2], 1, 1),
            topo(&[4, 3], 1, &[2, 0], 1, 1),
            topo(&[4, 3], 0, &[2, 2], 1, 1),
            topo(&[4, 3], 1, &[2, 2], 0, 1),
            topo(&[4, 3], 1, &[2, 2], 1, 0),
            topo(&[4, 3], 1, &[2, 2], 3, 1), //не помещается на 3-м уровне
            topo(&[4, 3], 1, &[5, 1], 1, 1),
        ];
        for t in &bad {
            assert!(
                matches!(NeuraNet::convolution(t), Err(NeuraNetError::InvalidArgument(_))),
                "{t:?}"
            );
        }
        //ячейка ровно во весь слой: один выход свертки
        let nn = NeuraNet::convolution(&topo(&[4, 3], 1, &[4, 3], 1, 1)).unwrap();
        assert_eq!(nn.nb_max_hidden(), 1);
    }

    #[test]
    fn huge_sizes() {
        //переполнение при подсчете размеров - ошибка, а не паника
        let huge = [
            topo(&[4, 3], 1, &[usize::MAX, 2], 2, 1),
            topo(&[4], 1, &[1], usize::MAX, 1),
            topo(&[4], 1, &[1], 1_000_000, 1_000_000),
            topo(&[usize::MAX / 2, 3], 1, &[1, 1], 1, 1),
        ];
        for t in &huge {
            assert!(
                matches!(NeuraNet::convolution(t), Err(NeuraNetError::InvalidArgument(_))),
                "{t:?}"
            );
        }
    }
}
