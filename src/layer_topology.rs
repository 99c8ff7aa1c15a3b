use crate::*;
use itertools::iproduct;

/// Топология скрытого слоя полносвязной сети
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerTopology {
    /// Количество значений в слое
    pub neurons: usize,
}

impl From<usize> for LayerTopology {
    fn from(neurons: usize) -> Self {
        Self { neurons }
    }
}

impl NeuraNet {
    /// Полносвязная сеть: связи от каждого входа к каждому значению 1-го скрытого слоя,
    /// от каждого значения 1-го скрытого слоя к каждому значению 2-го и т.д. до выходов.
    /// Без скрытых слоев входы связаны напрямую с выходами.
    /// У каждой связи своя базовая функция: nb_max_bases == nb_max_links.
    pub fn fully_connected(
        nb_input: usize,
        nb_output: usize,
        hidden_layers: &[LayerTopology],
    ) -> NeuraNetResult<Self> {
        if let Some(i) = hidden_layers.iter().position(|l| l.neurons == 0) {
            return Err(NeuraNetError::InvalidArgument(format!("hidden layer {i} is empty")));
        }
        //размеры всех слоев подряд: входы, скрытые, выходы
        let sizes: Vec<usize> = std::iter::once(nb_input)
            .chain(hidden_layers.iter().map(|l| l.neurons))
            .chain(std::iter::once(nb_output))
            .collect();
        let nb_hidden: usize = hidden_layers.iter().map(|l| l.neurons).sum();
        let nb_links: usize = sizes.iter().tuple_windows().map(|(a, b)| a * b).sum();
        let mut nn = NeuraNet::new(nb_input, nb_output, nb_hidden, nb_links.max(1), nb_links.max(1))?;

        let mut links: Vec<Link> = Vec::with_capacity(nb_links);
        let mut shift_in = 0;
        for (n_in, n_out) in sizes.iter().tuple_windows() {//обход пар соседних слоев
            let shift_out = shift_in + n_in;
            for (i_in, i_out) in iproduct!(0..*n_in, 0..*n_out) {
                let base = links.len() as i32;
                links.push(Link::new(base, (shift_in + i_in) as i32, (shift_out + i_out) as i32));
            }
            shift_in = shift_out;
        }
        nn.set_links(&links)?;
        tracing::debug!(nb_input, nb_output, nb_hidden, nb_links, "fully connected net created");
        Ok(nn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_connected() {
        let layers = [LayerTopology::from(4), LayerTopology::from(3)];
        let nn = NeuraNet::fully_connected(5, 2, &layers).unwrap();
        assert_eq!(nn.nb_input(), 5);
        assert_eq!(nn.nb_output(), 2);
        assert_eq!(nn.nb_max_hidden(), 7);
        assert_eq!(nn.nb_max_bases(), 38);
        assert_eq!(nn.nb_max_links(), 38);
        //(база, вход, выход)
        let expected: Vec<i32> = vec![
            0, 0, 5, 1, 0, 6, 2, 0, 7, 3, 0, 8,
            4, 1, 5, 5, 1, 6, 6, 1, 7, 7, 1, 8,
            8, 2, 5, 9, 2, 6, 10, 2, 7, 11, 2, 8,
            12, 3, 5, 13, 3, 6, 14, 3, 7, 15, 3, 8,
            16, 4, 5, 17, 4, 6, 18, 4, 7, 19, 4, 8,
            20, 5, 9, 21, 5, 10, 22, 5, 11,
            23, 6, 9, 24, 6, 10, 25, 6, 11,
            26, 7, 9, 27, 7, 10, 28, 7, 11,
            29, 8, 9, 30, 8, 10, 31, 8, 11,
            32, 9, 12, 33, 9, 13,
            34, 10, 12, 35, 10, 13,
            36, 11, 12, 37, 11, 13,
        ];
        assert_eq!(links_to_adn(nn.links()), expected);
        assert_eq!(nn.nb_active_links(), 38);
    }

    #[test]
    fn no_hidden_layer() {
        let nn = NeuraNet::fully_connected(3, 2, &[]).unwrap();
        assert_eq!(nn.nb_max_hidden(), 0);
        assert_eq!(nn.nb_max_links(), 6);
        assert_eq!(
            links_to_adn(nn.links()),
            vec![0, 0, 3, 1, 0, 4, 2, 1, 3, 3, 1, 4, 4, 2, 3, 5, 2, 4]
        );
        //с единичными базами выход = сумма входов
        let mut nn = nn;
        let bases: Vec<f32> = [0.5, 0.0, 0.0].repeat(6);
        nn.set_bases(&bases).unwrap();
        let mut output = [0.0f32; 2];
        nn.eval(&[0.1, 0.2, 0.3], &mut output).unwrap();
        let t = (0.5 * NN_THETA).tan();
        approx::assert_relative_eq!(output.as_slice(), [0.6 * t, 0.6 * t].as_slice(), epsilon = 1e-5);
    }

    #[test]
    fn invalid() {
        assert!(NeuraNet::fully_connected(0, 2, &[]).is_err());
        assert!(NeuraNet::fully_connected(2, 0, &[]).is_err());
        assert!(NeuraNet::fully_connected(2, 2, &[LayerTopology::from(0)]).is_err());
    }
}
